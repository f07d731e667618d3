use batch_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选) 与日志
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    init_logger_with_file(config.log_dir.as_deref());

    print_banner();
    tracing::info!(
        work_dir = %config.work_dir.display(),
        downloads = %config.download_root.display(),
        watermarked = %config.watermark_root.display(),
        "Batch server starting..."
    );

    // 2. 初始化服务器状态
    let state = ServerState::initialize(&config).await?;

    // 3. 启动 HTTP 服务器
    let server = Server::new(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
