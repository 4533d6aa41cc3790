//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VoiceError {
    #[error("Invalid voice ID '{0}': must start with a letter and be at least 8 letters or digits")]
    InvalidVoiceId(String),

    #[error("Invalid voice settings: {0}")]
    InvalidSettings(&'static str),

    #[error("Text cannot be empty")]
    EmptyText,
}
