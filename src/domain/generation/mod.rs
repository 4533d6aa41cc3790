//! Generation Context - 远程生成任务上下文
//!
//! 职责:
//! - 视频生成任务聚合（状态机）
//! - 生成请求参数校验
//! - 远程状态字符串映射

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::GenerationTask;
pub use errors::GenerationError;
pub use value_objects::{FileRef, Progress, TaskSnapshot, TaskStatus, VideoModel, VideoRequest};
