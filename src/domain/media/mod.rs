//! Media Context - 上传与音乐生成上下文
//!
//! 职责:
//! - 上传用途与上传策略（大小、时长）
//! - 音乐生成请求校验

mod errors;
mod value_objects;

pub use errors::MediaError;
pub use value_objects::{AudioUploadPolicy, MusicReferences, MusicRequest, UploadPurpose};
