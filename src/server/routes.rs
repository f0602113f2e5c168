//! 数据接口路由
//!
//! `GET /api/data` 返回当前文档；`?regenerate=true` 先跑分析再返回。
//! 分析失败时返回 500 并保留原文档，响应体始终是完整文档或错误文本

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::{error, info};

use crate::services::GeminiClient;
use crate::workflow::AnalysisFlow;

/// HTTP 层共享状态
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<AnalysisFlow<GeminiClient>>,
}

/// 数据接口的查询参数
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    /// "true" 时先触发一次分析
    regenerate: Option<String>,
}

/// 构建路由表
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(get_data).options(preflight))
        .with_state(state)
}

/// 返回持久化文档，按需先跑分析
async fn get_data(State(state): State<AppState>, Query(query): Query<DataQuery>) -> Response {
    if query.regenerate.as_deref() == Some("true") {
        match state.flow.run().await {
            Ok(_) => info!("分析完成，文档已更新"),
            Err(e) => {
                error!("分析失败: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("分析失败: {}", e),
                )
                    .into_response();
            }
        }
    }

    // 无论是否刚刚再生成，都返回磁盘上的当前文档
    match state.flow.store().load() {
        Ok(document) => Json(document).into_response(),
        Err(e) => {
            error!("读取文档失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("读取文档失败: {}", e),
            )
                .into_response()
        }
    }
}

/// OPTIONS 预检返回无内容
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
