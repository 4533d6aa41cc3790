//! Data Transfer Objects
//!
//! 服务端与代理客户端共用同一套请求/响应结构

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ChatMessage, Role};
use crate::domain::generation::TaskStatus;
use crate::domain::voice::VoiceSettings;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub errno: i32,
    #[serde(default)]
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.errno == 0
    }
}

// ============================================================================
// Ping
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub role: Role,
}

// ============================================================================
// Speech / Voice
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct T2aRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub voice_setting: VoiceSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_boost: Option<String>,
}

/// base64 编码的音频
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioResponse {
    pub audio: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CloneVoiceBody {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub voice_id: String,
    #[serde(default)]
    pub noise_reduction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceIdResponse {
    pub voice_id: String,
}

// ============================================================================
// Files / Music
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct FileIdResponse {
    pub file_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MusicGenerateBody {
    #[serde(default)]
    pub lyrics: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer_voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer_instrumental: Option<String>,
}

// ============================================================================
// Video
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoGenerateBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: String,
    /// 缺省为 true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_optimizer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_frame_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskIdResponse {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoStatusQuery {
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoStatusResponse {
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}
