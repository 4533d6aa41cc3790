//! Generation Context - Errors

use thiserror::Error;

use super::TaskStatus;

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Model {model} requires a {reference} reference")]
    MissingReference {
        model: &'static str,
        reference: &'static str,
    },

    #[error("Unknown video model: {0}")]
    UnknownModel(String),

    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}
