//! 分析上下文
//!
//! 封装"这次分析需要从文档里取哪些东西"：题目描述、提交历史、评级映射
//!
//! 文档各段都可能缺失或掺杂脏数据，提取一律宽松：
//! 缺段按空值处理，单条不符合结构的记录跳过，绝不让脏数据中断整次分析

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::CodeSnapshot;

/// 评级映射条目（来自上一轮分析的 individual_assessment）
#[derive(Debug, Deserialize)]
struct GradeEntry {
    student_id: i64,
    performance_level: String,
}

/// 一次分析的输入上下文
#[derive(Debug, Default)]
pub struct AnalysisContext {
    /// 题目描述原文
    pub problem_description: String,
    /// 完整提交历史（未归并）
    pub snapshots: Vec<CodeSnapshot>,
    /// 学生 ID 到评级标签的映射；来自独立维护的前次评估，只读
    pub grade_index: HashMap<i64, String>,
}

impl AnalysisContext {
    /// 从持久化文档中提取分析输入
    pub fn from_document(document: &Value) -> Self {
        let problem_description = document
            .pointer("/problemDescription/problem_description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let snapshots: Vec<CodeSnapshot> = document
            .pointer("/codeSnapshots/entries")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let grade_index: HashMap<i64, String> = document
            .pointer("/analysisData/individual_assessment")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value::<GradeEntry>(entry.clone()).ok())
                    .map(|e| (e.student_id, e.performance_level))
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "上下文提取完成: 题目描述 {} 字符, {} 条快照, {} 条评级",
            problem_description.chars().count(),
            snapshots.len(),
            grade_index.len()
        );

        Self {
            problem_description,
            snapshots,
            grade_index,
        }
    }
}
