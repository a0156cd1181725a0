use thiserror::Error;

/// Errors produced by the embedding pipeline.
///
/// The type is `Clone` because a single in-flight metadata fetch can be
/// awaited by several macro resolutions at once, and each of them receives
/// its own copy of the outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TubeError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Plugin endpoint returned status {0}")]
    Status(u16),

    #[error("JSON parsing failed: {0}")]
    Json(String),

    #[error("Chat message {0} not found")]
    MessageNotFound(usize),
}

impl From<reqwest::Error> for TubeError {
    fn from(err: reqwest::Error) -> Self {
        TubeError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for TubeError {
    fn from(err: serde_json::Error) -> Self {
        TubeError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TubeError>;
