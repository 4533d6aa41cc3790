//! Conversation Context - Aggregate Root

use super::{ChatMessage, ConversationError, Role};

/// 对话历史
///
/// 不变量:
/// - 以 assistant 欢迎语开头
/// - user / assistant 严格交替
/// - 至多一条未回复的 user 消息位于末尾
#[derive(Debug, Clone)]
pub struct Conversation {
    welcome: String,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(welcome: impl Into<String>) -> Self {
        let welcome = welcome.into();
        Self {
            messages: vec![ChatMessage::assistant(welcome.clone())],
            welcome,
        }
    }

    /// 追加用户消息
    pub fn push_user(&mut self, content: &str) -> Result<(), ConversationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        self.expect_next(Role::User)?;
        self.messages.push(ChatMessage::user(content));
        Ok(())
    }

    /// 追加助手回复，必须紧跟在用户消息之后
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.expect_next(Role::Assistant)?;
        self.messages.push(ChatMessage::assistant(content));
        Ok(())
    }

    /// 撤销末尾未回复的用户消息（请求失败或超时）
    pub fn rollback_pending(&mut self) -> Option<ChatMessage> {
        if self.awaiting_reply() {
            self.messages.pop()
        } else {
            None
        }
    }

    /// 重置为仅含欢迎语
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(self.welcome.clone())];
    }

    pub fn awaiting_reply(&self) -> bool {
        matches!(self.messages.last(), Some(m) if m.role == Role::User)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn expect_next(&self, role: Role) -> Result<(), ConversationError> {
        let expected = match self.messages.last().map(|m| m.role) {
            Some(Role::User) => Role::Assistant,
            _ => Role::User,
        };
        if expected != role {
            return Err(ConversationError::OutOfOrder {
                expected,
                actual: role,
            });
        }
        Ok(())
    }
}
