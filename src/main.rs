//! genstudio - 代理服务端
//!
//! 注入平台凭证，把 /api/* 请求转发到上游生成式平台

use std::sync::Arc;

use genstudio::config::{load_config, print_config, validate_server_credentials};
use genstudio::domain::generation::VideoModel;
use genstudio::infrastructure::adapters::{MiniMaxClient, SymphoniaDecoder};
use genstudio::infrastructure::http::{AppState, HttpServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    genstudio::init_tracing(&config.log.level);

    tracing::info!("genstudio proxy server");
    print_config(&config);
    validate_server_credentials(&config)?;

    // 创建上游平台客户端
    let platform = Arc::new(MiniMaxClient::new(config.minimax_client())?);
    let default_video_model: VideoModel = config.video.default_model.parse()?;

    let state = AppState::new(
        platform,
        Arc::new(SymphoniaDecoder::new()),
        config.upload_policy(),
        default_video_model,
    );

    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    server_config.max_body_bytes = config.server.max_body_bytes;
    if config.server.static_files.enabled {
        server_config = server_config.with_static_files(&config.server.static_files.dir);
    }

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
