use std::time::Duration;
use thiserror::Error;

use crate::providers::errors::ApiError;

/// The classified outcome of an exchange that did not produce a reply
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("User message is missing or empty")]
    InvalidInput,

    #[error("Remote service unavailable while trying to {operation}: {source}")]
    RemoteUnavailable {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Assistant run failed: {0}")]
    RunFailed(String),

    /// Carries how long the run was waited on, whichever bound ran out
    #[error("Assistant run did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Exchange cancelled by the caller")]
    Cancelled,
}

impl ExchangeError {
    pub fn remote(operation: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| ExchangeError::RemoteUnavailable { operation, source }
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message() {
        let error = ExchangeError::remote("create thread")(ApiError::Status {
            status: 401,
            code: Some("invalid_api_key".to_string()),
            message: "Incorrect API key provided".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Remote service unavailable while trying to create thread: \
             Request failed with status 401: Incorrect API key provided"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_timeout_message() {
        let error = ExchangeError::Timeout(Duration::from_secs(60));
        assert_eq!(error.to_string(), "Assistant run did not finish within 60s");
    }
}
