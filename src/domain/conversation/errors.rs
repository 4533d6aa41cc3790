//! Conversation Context - Errors

use thiserror::Error;

use super::Role;

#[derive(Debug, Error, PartialEq)]
pub enum ConversationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Out-of-order message: expected {expected}, got {actual}")]
    OutOfOrder { expected: Role, actual: Role },
}
