//! 分析流程 - 流程层
//!
//! 核心职责：编排一次完整的提交分析
//!
//! 流程顺序：
//! 1. 读文档 → 提取上下文 → 快照归并
//! 2. 构建提示词 → 调用推理服务 → 清洗响应
//! 3. 投影（聚合分析 + 本地统计）→ 合并 → 原子写回
//!
//! 单次触发同步跑完，任何一步失败整次分析中止，
//! 磁盘上的文档保持上一次提交的状态——绝不落半成品

use serde_json::Value;
use tracing::info;

use crate::error::AppResult;
use crate::models::AnalysisData;
use crate::services::document_store::DocumentStore;
use crate::services::gemini_client::AnalysisOracle;
use crate::services::{projector, prompt_builder, sanitizer, snapshot_reducer};
use crate::workflow::analysis_ctx::AnalysisContext;

/// 分析流程
///
/// 对推理服务只依赖 `AnalysisOracle` 能力接口，测试时可替换为假实现
pub struct AnalysisFlow<O: AnalysisOracle> {
    store: DocumentStore,
    oracle: O,
}

impl<O: AnalysisOracle> AnalysisFlow<O> {
    /// 创建新的分析流程
    pub fn new(store: DocumentStore, oracle: O) -> Self {
        Self { store, oracle }
    }

    /// 文档存储（供 HTTP 层直接读文档用）
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// 推理服务实例（测试中校验提示词用）
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// 跑一次完整分析，返回合并后的文档
    pub async fn run(&self) -> AppResult<Value> {
        info!("🚀 开始分析流程");

        // ========== 阶段 1: 读取与归并 ==========
        let document = self.store.load()?;
        let ctx = AnalysisContext::from_document(&document);

        let latest = snapshot_reducer::reduce(&ctx.snapshots);
        info!(
            "📋 快照归并: {} 条提交 -> {} 个学生",
            ctx.snapshots.len(),
            latest.len()
        );

        // ========== 阶段 2: 调用推理服务 ==========
        let prompt = prompt_builder::build(&ctx.problem_description, &ctx.grade_index, &latest);

        info!("🤖 正在调用推理服务...");
        let raw = self.oracle.analyze(&prompt).await?;

        let clean = sanitizer::sanitize(&raw)?;

        // ========== 阶段 3: 投影与写回 ==========
        let aggregate = projector::extract_aggregate(&clean)?;
        info!(
            "✓ 分析完成: {} 个高频错误, {} 个关联, {} 个误解",
            aggregate.top_errors.len(),
            aggregate.error_correlations.len(),
            aggregate.potential_misconceptions.len()
        );

        let overall = projector::overall_assessment(&latest, &ctx.grade_index);
        let individual = projector::individual_assessment(&latest, &ctx.grade_index);

        let data = AnalysisData::new(overall, individual, aggregate);
        let merged = self.store.merge(document, &data)?;
        self.store.save(&merged)?;

        info!("✓ 分析结果已写回 {}", self.store.path().display());

        Ok(merged)
    }
}
