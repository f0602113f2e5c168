//! 流程层
//!
//! 定义"一次分析"的完整处理流程，只依赖业务能力（services），不持有资源

pub mod analysis_ctx;
pub mod analysis_flow;

pub use analysis_ctx::AnalysisContext;
pub use analysis_flow::AnalysisFlow;
