//! 应用层错误定义
//!
//! 用例边界的统一错误类型，每个动作最终只向用户展示一条消息

use thiserror::Error;

use crate::application::ports::{DecodeError, PlatformError, RegistryError};
use crate::application::services::{PlaybackError, PollerError};
use crate::domain::conversation::ConversationError;
use crate::domain::generation::GenerationError;
use crate::domain::media::MediaError;
use crate::domain::voice::VoiceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 网络传输失败
    #[error("Transport error: {0}")]
    Transport(String),

    /// 远端返回非成功状态
    #[error("Remote error ({status}): {message}")]
    RemoteStatus { status: i64, message: String },

    /// 音频无法解码
    #[error("Decode error: {0}")]
    Decode(String),

    /// 输入校验失败
    #[error("Validation error: {0}")]
    Validation(String),

    /// 等待超时
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// 远程生成任务失败
    #[error("Generation failed for task {task_id}")]
    GenerationFailed { task_id: String },

    /// 通道上已有进行中的操作
    #[error("Busy: {channel} operation already in progress")]
    Busy { channel: &'static str },

    /// 操作被取消或被新操作抢占
    #[error("Operation cancelled")]
    Cancelled,

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// 面向用户的单行提示
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Network error, please check your connection and try again".to_string(),
            Self::RemoteStatus { message, .. } if !message.is_empty() => message.clone(),
            Self::RemoteStatus { status, .. } => format!("Request failed (status {})", status),
            Self::Decode(_) => "Unable to play the received audio".to_string(),
            Self::Validation(message) => message.clone(),
            Self::Timeout(_) => "Request timed out, please try again".to_string(),
            Self::GenerationFailed { .. } => "Video generation failed".to_string(),
            Self::Busy { .. } => "Please wait for the current request to finish".to_string(),
            Self::Cancelled => "Cancelled".to_string(),
            Self::Internal(_) => "Something went wrong".to_string(),
        }
    }
}

impl From<PlatformError> for ApplicationError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Transport(message) => Self::Transport(message),
            PlatformError::RemoteStatus { status, message } => Self::RemoteStatus { status, message },
            PlatformError::InvalidResponse(message) => {
                Self::Transport(format!("invalid response: {}", message))
            }
            PlatformError::Timeout => Self::Timeout("upstream request".to_string()),
        }
    }
}

impl From<PollerError> for ApplicationError {
    fn from(err: PollerError) -> Self {
        match err {
            PollerError::Submission(e)
            | PollerError::Poll(e)
            | PollerError::Resolve(e) => e.into(),
            PollerError::GenerationFailed { task_id } => Self::GenerationFailed { task_id },
            PollerError::MissingArtifact { task_id } => {
                Self::Internal(format!("task {} completed without a file", task_id))
            }
            PollerError::PollLimitExceeded { polls, .. } => {
                Self::Timeout(format!("video task still running after {} polls", polls))
            }
            PollerError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Decode { source, .. } => Self::Decode(source.to_string()),
            PlaybackError::Source(e) => e.into(),
            PlaybackError::Sink(e) => Self::Internal(e.to_string()),
            PlaybackError::Stopped => Self::Cancelled,
        }
    }
}

impl From<DecodeError> for ApplicationError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<RegistryError> for ApplicationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Busy(channel) => Self::Busy {
                channel: channel.as_str(),
            },
        }
    }
}

impl From<ConversationError> for ApplicationError {
    fn from(err: ConversationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidTransition { .. } => Self::Internal(err.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<MediaError> for ApplicationError {
    fn from(err: MediaError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_message_is_shown() {
        let err: ApplicationError = PlatformError::remote(1004, "authentication failed").into();
        assert_eq!(err.user_message(), "authentication failed");
    }

    #[test]
    fn test_voice_error_is_validation() {
        let err: ApplicationError = VoiceError::InvalidVoiceId("ab".to_string()).into();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[test]
    fn test_poller_failure_maps_to_generation_failed() {
        let err: ApplicationError = PollerError::GenerationFailed {
            task_id: "t1".to_string(),
        }
        .into();
        assert!(matches!(err, ApplicationError::GenerationFailed { task_id } if task_id == "t1"));
    }
}
