//! 分析结果模型
//!
//! 分为两类：
//! - 推理服务返回的聚合分析（`AggregateAnalysis` 及其子结构），字段内容对本服务不透明，
//!   只做结构校验
//! - 本地可计算的统计（`OverallAssessment` / `IndividualAssessment`），不依赖推理服务
//!
//! 字段名与仪表盘消费的 JSON 保持一致，全部 snake_case；
//! 推理服务可能漏掉个别字段，因此统一加 `#[serde(default)]` 容错

use serde::{Deserialize, Serialize};

/// 推理服务返回的聚合分析
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateAnalysis {
    #[serde(default)]
    pub top_errors: Vec<TopError>,
    #[serde(default)]
    pub error_correlations: Vec<ErrorCorrelation>,
    #[serde(default)]
    pub potential_misconceptions: Vec<PotentialMisconception>,
}

/// 高频错误类别（最多 5 个）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopError {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub occurrence_count: i64,
    #[serde(default)]
    pub occurrence_percentage: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example_code: Vec<String>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

/// 错误共现关联（3-5 个）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorCorrelation {
    #[serde(default)]
    pub correlated_errors: Vec<String>,
    #[serde(default)]
    pub correlation_count: i64,
    #[serde(default)]
    pub correlation_percentage: String,
    #[serde(default)]
    pub hypothesis: String,
    #[serde(default)]
    pub example_code: Vec<String>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

/// 潜在概念误解（1-3 个），附带可用于教学干预的补救内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PotentialMisconception {
    #[serde(default)]
    pub misconception: String,
    #[serde(default)]
    pub related_error_categories: Vec<String>,
    #[serde(default)]
    pub occurrence_count: i64,
    #[serde(default)]
    pub occurrence_percentage: String,
    #[serde(default)]
    pub explanation_diagnostic: String,
    #[serde(default)]
    pub example_code_error: Vec<String>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
    #[serde(default)]
    pub suggested_explanation_for_students: String,
    #[serde(default)]
    pub correct_code_example: Vec<String>,
    #[serde(default)]
    pub follow_up_question: String,
}

// ========== 本地统计结构 ==========

/// 单个评级的统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelStat {
    pub count: usize,
    /// 固定两位小数，如 "33.33%"；总人数为 0 时恒为 "0.00%"
    pub percentage: String,
}

/// 全班评级分布
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceDistribution {
    pub correct: LabelStat,
    pub incorrect: LabelStat,
    pub not_assessed: LabelStat,
}

/// 全班总体评估
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub total_entries: usize,
    pub performance_distribution: PerformanceDistribution,
}

/// 单个学生的评估条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndividualAssessment {
    pub student_id: i64,
    /// "Correct" / "Incorrect" / 教师自定义标签，缺省为 "NotAssessed"
    pub performance_level: String,
}

/// 写回持久化文档 `analysisData` 键的完整分析段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisData {
    pub problem_summary: ProblemSummary,
    #[serde(rename = "isEnable")]
    pub is_enable: bool,
    pub overall_assessment: OverallAssessment,
    pub individual_assessment: Vec<IndividualAssessment>,
    pub aggregate_analysis: AggregateAnalysis,
}

/// 分析段标题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub title: String,
}

impl AnalysisData {
    /// 组装一次完整分析的结果段
    pub fn new(
        overall: OverallAssessment,
        individual: Vec<IndividualAssessment>,
        aggregate: AggregateAnalysis,
    ) -> Self {
        Self {
            problem_summary: ProblemSummary {
                title: "AI Generated Analysis".to_string(),
            },
            is_enable: true,
            overall_assessment: overall,
            individual_assessment: individual,
            aggregate_analysis: aggregate,
        }
    }
}
