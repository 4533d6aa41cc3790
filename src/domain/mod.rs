//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Generation Context: 视频生成任务
//! - Conversation Context: 对话历史
//! - Voice Context: 音色与语音参数
//! - Media Context: 上传与音乐
//! - Audio Context: 语音片段与 PCM

pub mod audio;
pub mod conversation;
pub mod generation;
pub mod media;
pub mod voice;
