//! 业务能力层
//!
//! 每个服务只提供一种能力，不关心流程顺序，流程由 `workflow` 层编排

pub mod document_store;
pub mod gemini_client;
pub mod prompt_builder;
pub mod projector;
pub mod sanitizer;
pub mod snapshot_reducer;

pub use document_store::DocumentStore;
pub use gemini_client::{AnalysisOracle, GeminiClient};
