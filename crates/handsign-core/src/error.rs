//! Error types for the handsign gesture pipeline.

use thiserror::Error;

use crate::types::HandJoint;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing joint data: {joint} is absent or untracked")]
    MissingJointData { joint: HandJoint },

    #[error("Insufficient history: need {required} samples, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Sample index {index} out of range for window of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Frame source closed")]
    SourceClosed,

    #[error("Frame source not started")]
    SourceNotStarted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
