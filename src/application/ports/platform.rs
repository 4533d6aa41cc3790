//! Generative Platform Port - 生成式平台抽象
//!
//! 客户端核心与服务端用例都只依赖此端口。
//! 具体实现：上游直连客户端、代理客户端、测试用脚本化平台。

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::conversation::ChatMessage;
use crate::domain::generation::{FileRef, TaskSnapshot, VideoRequest};
use crate::domain::media::{MusicReferences, MusicRequest, UploadPurpose};
use crate::domain::voice::{VoiceId, VoiceSettings};

/// 平台调用错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Remote error ({status}): {message}")]
    RemoteStatus { status: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl PlatformError {
    pub fn remote(status: i64, message: impl Into<String>) -> Self {
        Self::RemoteStatus {
            status,
            message: message.into(),
        }
    }
}

/// 流式语音字节流（按网络读取切分，行边界不保证对齐）
pub type SpeechByteStream = BoxStream<'static, Result<Vec<u8>, PlatformError>>;

/// 语音合成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub voice_setting: VoiceSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_boost: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice_setting: VoiceSettings) -> Self {
        Self {
            text: text.into(),
            stream: false,
            voice_setting,
            language_boost: None,
        }
    }

    pub fn streamed(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_language_boost(mut self, language_boost: Option<String>) -> Self {
        self.language_boost = language_boost;
        self
    }
}

/// 语音合成结果
pub enum SpeechOutput {
    /// 单个 base64 音频
    Single(String),
    /// `data:` 事件行组成的字节流
    Stream(SpeechByteStream),
}

impl std::fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechOutput::Single(payload) => f
                .debug_tuple("Single")
                .field(&format_args!("{} bytes", payload.len()))
                .finish(),
            SpeechOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// 待上传文件
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub purpose: UploadPurpose,
}

impl UploadFile {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, purpose: UploadPurpose) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            purpose,
        }
    }
}

/// 音色克隆请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneVoiceRequest {
    pub file_id: FileRef,
    pub voice_id: VoiceId,
    #[serde(default)]
    pub noise_reduction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Generative Platform Port
#[async_trait]
pub trait GenerativePlatformPort: Send + Sync {
    /// 对话补全，返回助手回复文本
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PlatformError>;

    /// 语音合成
    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SpeechOutput, PlatformError>;

    /// 提交视频生成任务，返回远端任务 ID
    async fn submit_video_task(&self, request: &VideoRequest) -> Result<String, PlatformError>;

    /// 查询视频任务状态
    async fn poll_video_task(&self, task_id: &str) -> Result<TaskSnapshot, PlatformError>;

    /// 将文件引用解析为下载地址
    async fn resolve_file(&self, file_ref: &FileRef) -> Result<String, PlatformError>;

    /// 上传文件，返回文件引用
    async fn upload_file(&self, file: UploadFile) -> Result<FileRef, PlatformError>;

    /// 克隆音色
    async fn clone_voice(&self, request: CloneVoiceRequest) -> Result<VoiceId, PlatformError>;

    /// 上传音乐参考
    async fn upload_music(&self, file: UploadFile) -> Result<MusicReferences, PlatformError>;

    /// 生成音乐，返回解码后的音频字节
    async fn generate_music(&self, request: &MusicRequest) -> Result<Vec<u8>, PlatformError>;

    /// 下载生成产物
    async fn download_artifact(&self, url: &str) -> Result<Vec<u8>, PlatformError>;

    /// 检查平台是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
