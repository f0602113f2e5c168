//! 快照归并服务 - 业务能力层
//!
//! 只负责"每个学生保留最新一份提交"能力，不关心流程
//!
//! 时间戳按固定格式解析；解析失败的时间戳按最小时间处理，
//! 绝不因为脏数据中断整次分析

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::models::CodeSnapshot;

/// 提交时间戳的固定格式
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 将完整提交历史归并为"每个学生一条最新记录"
///
/// # 参数
/// - `snapshots`: 完整提交历史（同一学生可能出现多次）
///
/// # 返回
/// 以 `student_id` 为键的最新快照集合；迭代顺序不保证，
/// 下游只能依赖键的唯一性
pub fn reduce(snapshots: &[CodeSnapshot]) -> HashMap<i64, CodeSnapshot> {
    let mut latest: HashMap<i64, CodeSnapshot> = HashMap::new();

    for snapshot in snapshots {
        match latest.get(&snapshot.student_id) {
            None => {
                latest.insert(snapshot.student_id, snapshot.clone());
            }
            Some(existing) => {
                // 严格晚于才替换，时间相同保留先出现的
                if parse_timestamp(&snapshot.timestamp) > parse_timestamp(&existing.timestamp) {
                    latest.insert(snapshot.student_id, snapshot.clone());
                }
            }
        }
    }

    debug!(
        "快照归并完成: {} 条记录 -> {} 个学生",
        snapshots.len(),
        latest.len()
    );

    latest
}

/// 解析提交时间戳
///
/// 解析失败返回最小时间，使脏数据在比较中永远落败
fn parse_timestamp(timestamp: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).unwrap_or_else(|_| {
        warn!("时间戳格式非法，按最小时间处理: '{}'", timestamp);
        NaiveDateTime::MIN
    })
}
