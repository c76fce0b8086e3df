use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not read photo {path}: {source}")]
    PhotoRead {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl ClientError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ClientError::InvalidInput(message.into())
    }
}
