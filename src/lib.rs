//! genstudio - 生成式媒体工作室
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Conversation Context: 对话历史
//! - Generation Context: 视频生成任务状态机
//! - Voice Context: 音色与语音参数
//! - Media Context: 上传用途与音乐请求
//! - Audio Context: 流式语音片段与 PCM
//!
//! 应用层 (application/):
//! - Ports: 端口定义（GenerativePlatform, AudioDecoder, AudioSink, Events, OperationRegistry）
//! - Services: TaskPoller, StreamingAudioPlayer, StudioSession
//! - Commands / Queries: 代理服务端用例
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 代理服务端 RESTful API
//! - Adapters: MiniMax / 代理 / Fake 平台客户端，symphonia 解码，音频输出
//! - Memory: 操作登记表
//! - Events: broadcast 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

/// 初始化日志，RUST_LOG 优先于配置的级别
pub fn init_tracing(level: &str) {
    let log_filter = format!("{},genstudio={},tower_http=debug", level, level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();
}
