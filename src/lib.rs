//! # Class Insight
//!
//! 一个分析学生代码提交、生成班级错误趋势的 Rust 服务
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 代码快照、聚合分析、本地统计的类型定义
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务一种能力
//! - `snapshot_reducer` - 每个学生保留最新提交
//! - `prompt_builder` - 确定性提示词渲染
//! - `gemini_client` - 推理服务调用（`AnalysisOracle` 能力接口）
//! - `sanitizer` - 响应修复 + 结构化解析门禁
//! - `projector` - 聚合分析提取 + 本地统计
//! - `document_store` - 文档读取 / 合并 / 原子写回
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次分析"的完整处理流程
//! - `AnalysisContext` - 输入提取（题目描述 + 快照 + 评级映射）
//! - `AnalysisFlow` - 流程编排（归并 → 提示词 → 推理 → 清洗 → 投影 → 写回）
//!
//! ### ④ 服务层（Server）
//! - `server/` - HTTP 数据接口，`regenerate=true` 触发分析
//!
//! ## 错误处理
//!
//! 任何一步失败整次分析中止，磁盘文档保持上一次提交的状态；
//! 错误分类见 `error` 模块

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AggregateAnalysis, AnalysisData, CodeSnapshot};
pub use services::{AnalysisOracle, DocumentStore, GeminiClient};
pub use workflow::{AnalysisContext, AnalysisFlow};
