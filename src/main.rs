use anyhow::Result;
use class_insight::config::Config;
use class_insight::server;
use class_insight::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config.listen_addr, &config.data_file);

    // 启动 HTTP 服务
    server::serve(config).await?;

    Ok(())
}
