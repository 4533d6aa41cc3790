//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod chat_handlers;
mod media_handlers;
mod speech_handlers;
mod video_handlers;

pub use chat_handlers::*;
pub use media_handlers::*;
pub use speech_handlers::*;
pub use video_handlers::*;
