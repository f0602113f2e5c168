//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 过滤级别由 RUST_LOG 控制，默认 info；verbose 模式强制 debug
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `listen_addr`: 监听地址
/// - `data_file`: 数据文件路径
pub fn log_startup(listen_addr: &str, data_file: &str) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("🚀 程序启动 - 提交分析服务");
    tracing::info!("📡 监听地址: {}", listen_addr);
    tracing::info!("📄 数据文件: {}", data_file);
    tracing::info!("{}", "=".repeat(60));
}
