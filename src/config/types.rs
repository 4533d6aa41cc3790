//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::{StudioSessionConfig, TaskPollerConfig};
use crate::domain::media::AudioUploadPolicy;
use crate::domain::voice::VoiceSettings;
use crate::infrastructure::adapters::{
    ChatModelSettings, MiniMaxClientConfig, MusicModelSettings, SpeechModelSettings,
};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 代理服务器配置
    pub server: ServerConfig,

    /// 上游平台配置
    pub platform: PlatformConfig,

    /// 对话配置
    pub chat: ChatConfig,

    /// 语音合成输出配置
    pub speech: SpeechConfig,

    /// 音乐生成输出配置
    pub music: MusicConfig,

    /// 视频任务配置
    pub video: VideoConfig,

    /// 上传策略
    pub upload: UploadConfig,

    /// 终端客户端配置
    pub client: ClientConfig,

    /// 日志配置
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,

    /// 监听端口
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    pub base_url: Option<String>,

    /// 静态文件服务配置
    pub static_files: StaticFilesConfig,

    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: None,
            static_files: StaticFilesConfig::default(),
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    pub enabled: bool,

    /// 静态文件目录（需包含 index.html）
    pub dir: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("public"),
        }
    }
}

/// 上游平台配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_url: String,
    pub api_key: String,
    pub group_id: String,

    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.minimaxi.chat/v1".to_string(),
            api_key: String::new(),
            group_id: String::new(),
            timeout_secs: 120,
        }
    }
}

/// 对话配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,

    /// 等待回复的超时（毫秒）
    pub reply_timeout_ms: u64,

    /// 会话开场白
    pub welcome_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let model = ChatModelSettings::default();
        Self {
            model: model.model,
            temperature: model.temperature,
            max_tokens: model.max_tokens,
            top_p: model.top_p,
            reply_timeout_ms: 30_000,
            welcome_message: "Hello! How can I help you today?".to_string(),
        }
    }
}

/// 语音合成输出配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub model: String,
    pub sample_rate: u32,
    pub bitrate: u32,
    pub format: String,
    pub channel: u8,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let speech = SpeechModelSettings::default();
        Self {
            model: speech.model,
            sample_rate: speech.sample_rate,
            bitrate: speech.bitrate,
            format: speech.format,
            channel: speech.channel,
        }
    }
}

/// 音乐生成输出配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub model: String,
    pub sample_rate: u32,
    pub bitrate: u32,
    pub format: String,
}

impl Default for MusicConfig {
    fn default() -> Self {
        let music = MusicModelSettings::default();
        Self {
            model: music.model,
            sample_rate: music.sample_rate,
            bitrate: music.bitrate,
            format: music.format,
        }
    }
}

/// 视频任务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// 请求未指定模型时使用
    pub default_model: String,

    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,

    /// 最大轮询次数，0 表示不限制
    pub max_polls: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            default_model: "video-01".to_string(),
            poll_interval_ms: 2000,
            max_polls: 0,
        }
    }
}

/// 克隆参考音频上传策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_audio_bytes: u64,
    pub min_audio_secs: u64,
    pub max_audio_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let policy = AudioUploadPolicy::default();
        Self {
            max_audio_bytes: policy.max_bytes,
            min_audio_secs: policy.min_duration.as_secs(),
            max_audio_secs: policy.max_duration.as_secs(),
        }
    }
}

/// 终端客户端配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 代理服务器地址
    pub proxy_url: String,

    /// 音频、视频、音乐的输出目录
    pub output_dir: PathBuf,

    /// 音频输出: "speaker"（声卡，需启用 speaker 特性）、
    /// "wav"（写文件并实时计时）或 "clock"（仅计时）
    pub sink: String,

    /// 是否请求流式语音
    pub stream_speech: bool,

    /// 默认音色参数
    pub voice: VoiceSettings,

    /// 语种增强，"auto" 表示不指定
    pub language_boost: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost:3000".to_string(),
            output_dir: PathBuf::from("output"),
            sink: "speaker".to_string(),
            stream_speech: true,
            voice: VoiceSettings::default(),
            language_boost: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 日志级别
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 上游客户端配置
    pub fn minimax_client(&self) -> MiniMaxClientConfig {
        MiniMaxClientConfig {
            base_url: self.platform.base_url.clone(),
            api_key: self.platform.api_key.clone(),
            group_id: self.platform.group_id.clone(),
            timeout_secs: self.platform.timeout_secs,
            chat: ChatModelSettings {
                model: self.chat.model.clone(),
                temperature: self.chat.temperature,
                max_tokens: self.chat.max_tokens,
                top_p: self.chat.top_p,
            },
            speech: SpeechModelSettings {
                model: self.speech.model.clone(),
                sample_rate: self.speech.sample_rate,
                bitrate: self.speech.bitrate,
                format: self.speech.format.clone(),
                channel: self.speech.channel,
            },
            music: MusicModelSettings {
                model: self.music.model.clone(),
                sample_rate: self.music.sample_rate,
                bitrate: self.music.bitrate,
                format: self.music.format.clone(),
            },
        }
    }

    pub fn upload_policy(&self) -> AudioUploadPolicy {
        AudioUploadPolicy {
            max_bytes: self.upload.max_audio_bytes,
            min_duration: Duration::from_secs(self.upload.min_audio_secs),
            max_duration: Duration::from_secs(self.upload.max_audio_secs),
        }
    }

    pub fn poller(&self) -> TaskPollerConfig {
        TaskPollerConfig {
            interval: Duration::from_millis(self.video.poll_interval_ms),
            max_polls: (self.video.max_polls > 0).then_some(self.video.max_polls),
        }
    }

    pub fn session(&self) -> StudioSessionConfig {
        StudioSessionConfig {
            welcome_message: self.chat.welcome_message.clone(),
            reply_timeout: Duration::from_millis(self.chat.reply_timeout_ms),
            voice: self.client.voice.clone(),
            stream_speech: self.client.stream_speech,
            language_boost: self.client.language_boost.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.platform.base_url, "https://api.minimaxi.chat/v1");
        assert_eq!(config.chat.reply_timeout_ms, 30_000);
        assert_eq!(config.video.poll_interval_ms, 2000);
        assert_eq!(config.video.max_polls, 0);
    }

    #[test]
    fn test_public_base_url() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.public_base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_zero_max_polls_is_unbounded() {
        let mut config = AppConfig::default();
        assert_eq!(config.poller().max_polls, None);

        config.video.max_polls = 30;
        assert_eq!(config.poller().max_polls, Some(30));
        assert_eq!(config.poller().interval, Duration::from_secs(2));
    }

    #[test]
    fn test_upload_policy_from_config() {
        let config = AppConfig::default();
        assert_eq!(config.upload_policy(), AudioUploadPolicy::default());
    }
}
