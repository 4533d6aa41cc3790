//! Conversation Context - 对话历史上下文
//!
//! 职责:
//! - 对话消息与角色
//! - 历史记录的严格交替顺序

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Conversation;
pub use errors::ConversationError;
pub use value_objects::{ChatMessage, Role};
