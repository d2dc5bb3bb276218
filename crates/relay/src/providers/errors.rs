use reqwest::StatusCode;
use thiserror::Error;

/// A failed call to the remote service
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed with status {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether repeating the same idempotent call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Status { status, code, .. } => {
                if *status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
                    // Exhausted quota does not recover within an exchange
                    code.as_deref() != Some("insufficient_quota")
                } else {
                    *status >= 500
                }
            }
            ApiError::Transport(err) => err.is_timeout() || err.is_connect(),
            ApiError::Decode(_) => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
