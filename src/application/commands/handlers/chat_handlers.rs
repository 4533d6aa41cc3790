//! Chat Command Handlers

use std::sync::Arc;

use crate::application::commands::{SendChat, SendChatResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::GenerativePlatformPort;
use crate::domain::conversation::Role;

/// SendChat Handler
pub struct ChatHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl ChatHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, command: SendChat) -> Result<SendChatResponse, ApplicationError> {
        let last = command
            .messages
            .last()
            .ok_or_else(|| ApplicationError::validation("messages cannot be empty"))?;
        if last.role != Role::User || last.content.trim().is_empty() {
            return Err(ApplicationError::validation(
                "the last message must be a non-empty user message",
            ));
        }

        let reply = self.platform.chat(&command.messages).await?;

        tracing::info!(
            messages = command.messages.len(),
            reply_len = reply.len(),
            "Chat completed"
        );

        Ok(SendChatResponse { reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatMessage;
    use crate::infrastructure::adapters::FakePlatform;

    #[tokio::test]
    async fn test_rejects_history_ending_with_reply() {
        let platform = Arc::new(FakePlatform::new());
        let handler = ChatHandler::new(platform.clone());

        let result = handler
            .handle(SendChat {
                messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Validation(_))));
        assert_eq!(platform.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_forwards_history() {
        let handler = ChatHandler::new(Arc::new(FakePlatform::new()));
        let response = handler
            .handle(SendChat {
                messages: vec![ChatMessage::assistant("welcome"), ChatMessage::user("ping")],
            })
            .await
            .unwrap();
        assert_eq!(response.reply, "You said: ping");
    }
}
