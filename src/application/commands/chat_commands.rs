//! Chat Commands

use crate::domain::conversation::ChatMessage;

/// 对话补全命令
#[derive(Debug, Clone)]
pub struct SendChat {
    pub messages: Vec<ChatMessage>,
}

/// 对话补全响应
#[derive(Debug, Clone)]
pub struct SendChatResponse {
    pub reply: String,
}
