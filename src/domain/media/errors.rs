//! Media Context - Errors

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MediaError {
    #[error("Unknown upload purpose: {0}")]
    UnknownPurpose(String),

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Audio duration {actual:?} outside allowed range {min:?}..={max:?}")]
    DurationOutOfRange {
        actual: Duration,
        min: Duration,
        max: Duration,
    },

    #[error("Lyrics cannot be empty")]
    EmptyLyrics,

    #[error("At least one reference (voice or instrumental) is required")]
    MissingReference,
}
