//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::generation::VideoModel;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "GENSTUDIO";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `GENSTUDIO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `GENSTUDIO_SERVER__PORT=8080`
/// - `GENSTUDIO_PLATFORM__API_KEY=...`
/// - `GENSTUDIO_PLATFORM__GROUP_ID=...`
/// - `GENSTUDIO_CLIENT__PROXY_URL=http://studio:3000`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    // 缺省字段由各配置结构的 Default 补齐
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }
    if config.platform.base_url.is_empty() {
        return invalid("Platform base URL cannot be empty");
    }
    if config.platform.timeout_secs == 0 {
        return invalid("Platform timeout cannot be 0");
    }
    if config.chat.reply_timeout_ms == 0 {
        return invalid("Chat reply timeout cannot be 0");
    }
    if config.video.poll_interval_ms == 0 {
        return invalid("Video poll interval cannot be 0");
    }
    if let Err(e) = config.video.default_model.parse::<VideoModel>() {
        return Err(ConfigError::ValidationError(e.to_string()));
    }
    if config.upload.max_audio_bytes == 0 {
        return invalid("Upload size limit cannot be 0");
    }
    if config.upload.min_audio_secs > config.upload.max_audio_secs {
        return invalid("Upload min duration exceeds max duration");
    }
    if !matches!(config.client.sink.as_str(), "speaker" | "wav" | "clock") {
        return invalid("Client sink must be 'speaker', 'wav' or 'clock'");
    }
    if let Err(e) = config.client.voice.validate() {
        return Err(ConfigError::ValidationError(e.to_string()));
    }

    Ok(())
}

/// 服务端还需要平台凭证
pub fn validate_server_credentials(config: &AppConfig) -> Result<(), ConfigError> {
    if config.platform.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "platform.api_key is required (GENSTUDIO_PLATFORM__API_KEY)".to_string(),
        ));
    }
    if config.platform.group_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "platform.group_id is required (GENSTUDIO_PLATFORM__GROUP_ID)".to_string(),
        ));
    }
    Ok(())
}

/// 打印配置信息（用于启动时日志），不输出凭证
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    if config.server.static_files.enabled {
        tracing::info!("Static Files: {:?}", config.server.static_files.dir);
    }
    tracing::info!("Platform URL: {}", config.platform.base_url);
    tracing::info!("Platform Timeout: {}s", config.platform.timeout_secs);
    tracing::info!(
        "API Key: {}",
        if config.platform.api_key.is_empty() { "<unset>" } else { "<set>" }
    );
    tracing::info!("Chat Model: {}", config.chat.model);
    tracing::info!("Speech Model: {}", config.speech.model);
    tracing::info!("Music Model: {}", config.music.model);
    tracing::info!(
        "Video: default model {}, poll every {}ms, max polls {}",
        config.video.default_model,
        config.video.poll_interval_ms,
        if config.video.max_polls == 0 { "unbounded".to_string() } else { config.video.max_polls.to_string() }
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
