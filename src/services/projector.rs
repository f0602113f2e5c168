//! 结果投影服务 - 业务能力层
//!
//! 两类投影：
//! - 从清洗后的 JSON 中提取推理服务的聚合分析（结构校验，内容不做语义判断）
//! - 根据最新快照和评级映射计算本地统计（与推理服务无关的纯函数）

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::analysis::{LabelStat, PerformanceDistribution};
use crate::models::{AggregateAnalysis, CodeSnapshot, IndividualAssessment, OverallAssessment};

/// 评级映射中缺失学生的默认标签
pub const NOT_ASSESSED: &str = "NotAssessed";

/// 从清洗后的 JSON 文本中提取聚合分析
///
/// 顶层对象必须包含 `aggregate_analysis` 键：
/// - 键不存在 → `MissingAggregateKey`
/// - 键存在但结构不符 → `SchemaMismatch`
///
/// 两种错误分开报告，调用方据此区分"模型忘了包一层"和"模型编了别的结构"
pub fn extract_aggregate(clean: &str) -> AppResult<AggregateAnalysis> {
    // clean 已通过清洗门禁，这里解析失败属于结构不符
    let value: Value = serde_json::from_str(clean).map_err(AppError::schema_mismatch)?;

    let inner = value
        .get("aggregate_analysis")
        .ok_or_else(AppError::missing_aggregate_key)?;

    let aggregate: AggregateAnalysis =
        serde_json::from_value(inner.clone()).map_err(AppError::schema_mismatch)?;

    debug!(
        "聚合分析提取完成: {} 个高频错误, {} 个关联, {} 个误解",
        aggregate.top_errors.len(),
        aggregate.error_correlations.len(),
        aggregate.potential_misconceptions.len()
    );

    Ok(aggregate)
}

/// 计算全班总体评估（评级分布）
///
/// 百分比固定两位小数；总人数为 0 时所有百分比定义为 "0.00%"，
/// 不做除法（显式可测性质，见单元测试）
pub fn overall_assessment(
    latest: &HashMap<i64, CodeSnapshot>,
    grade_index: &HashMap<i64, String>,
) -> OverallAssessment {
    let total = latest.len();
    let mut correct = 0usize;
    let mut incorrect = 0usize;
    let mut not_assessed = 0usize;

    for student_id in latest.keys() {
        match grade_index.get(student_id).map(String::as_str) {
            Some("Correct") => correct += 1,
            Some("Incorrect") => incorrect += 1,
            // 教师自定义标签和未评级的都归入 not_assessed 桶
            _ => not_assessed += 1,
        }
    }

    OverallAssessment {
        total_entries: total,
        performance_distribution: PerformanceDistribution {
            correct: label_stat(correct, total),
            incorrect: label_stat(incorrect, total),
            not_assessed: label_stat(not_assessed, total),
        },
    }
}

/// 生成单个学生评级统计
fn label_stat(count: usize, total: usize) -> LabelStat {
    LabelStat {
        count,
        percentage: format_percentage(count, total),
    }
}

/// 把占比格式化成固定两位小数的百分比字符串
///
/// 舍入规则：`format!("{:.2}")` 的十进制舍入（银行家舍入到偶数位）
fn format_percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", count as f64 / total as f64 * 100.0)
}

/// 生成逐学生评估列表
///
/// 每个出现在 `latest` 中的学生恰好一条；评级映射中缺失的学生
/// 标记为 "NotAssessed"。按学生 ID 排序保证输出稳定
pub fn individual_assessment(
    latest: &HashMap<i64, CodeSnapshot>,
    grade_index: &HashMap<i64, String>,
) -> Vec<IndividualAssessment> {
    let mut assessments: Vec<IndividualAssessment> = latest
        .keys()
        .map(|student_id| IndividualAssessment {
            student_id: *student_id,
            performance_level: grade_index
                .get(student_id)
                .cloned()
                .unwrap_or_else(|| NOT_ASSESSED.to_string()),
        })
        .collect();

    assessments.sort_by_key(|a| a.student_id);
    assessments
}
