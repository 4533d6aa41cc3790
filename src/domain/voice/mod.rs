//! Voice Context - 音色上下文
//!
//! 职责:
//! - 克隆音色 ID 校验
//! - 语音合成参数校验
//! - 会话内克隆音色集合

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::ClonedVoices;
pub use errors::VoiceError;
pub use value_objects::{normalize_language_boost, VoiceId, VoiceSettings};
