//! Error types for calls against the tracking backend.

/// Errors surfaced by the gateway and the operations built on it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable HTTP response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status or `success: false`.
    #[error("{message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// Input rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a body of the wrong shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        ClientError::UnexpectedResponse(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
