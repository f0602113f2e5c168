//! HTTP 服务层
//!
//! 对外只有一个数据接口：返回持久化文档，带 `regenerate=true` 时先跑一次分析。
//! 跨域全放开（仪表盘前端独立部署）

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::services::{DocumentStore, GeminiClient};
use crate::workflow::AnalysisFlow;

pub use routes::AppState;

/// 启动 HTTP 服务，阻塞直到服务退出
pub async fn serve(config: Config) -> Result<()> {
    let store = DocumentStore::new(&config);
    let oracle = GeminiClient::new(&config);
    let flow = AnalysisFlow::new(store, oracle);

    let state = AppState {
        flow: Arc::new(flow),
    };

    let app = routes::routes(state).layer(CorsLayer::very_permissive());

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("监听地址非法: {}", config.listen_addr))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;

    info!("🚀 服务已启动: http://{}", addr);

    axum::serve(listener, app).await.context("HTTP 服务异常退出")?;

    Ok(())
}
