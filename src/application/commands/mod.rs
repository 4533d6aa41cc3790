//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：所有会调用上游生成能力的操作

mod chat_commands;
mod media_commands;
mod speech_commands;
mod video_commands;

pub mod handlers;

pub use chat_commands::*;
pub use media_commands::*;
pub use speech_commands::*;
pub use video_commands::*;
