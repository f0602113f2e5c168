//! 代码快照模型
//!
//! 对应持久化文档 `codeSnapshots.entries` 中的一条提交记录。
//! 同一个学生可能出现多次，`snapshot_id` / `timestamp` 标识同一学生的不同版本。

use serde::{Deserialize, Serialize};

/// 学生代码快照
///
/// 记录一次创建后不可变，持久化存储中只追加不修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeSnapshot {
    #[serde(default)]
    pub student_id: i64,
    /// 提交时间，格式固定为 "%Y-%m-%d %H:%M:%S"
    #[serde(default)]
    pub timestamp: String,
    /// 学生源代码
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub snapshot_id: i64,
}
