//! Error types for text processing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Invalid pattern for slot {slot} ({pattern}): {message}")]
    InvalidPattern {
        slot: String,
        pattern: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;

impl From<TextProcessingError> for scheme_saathi_core::Error {
    fn from(err: TextProcessingError) -> Self {
        scheme_saathi_core::Error::Config(err.to_string())
    }
}
