//! Error types for the micro client

use thiserror::Error;

use crate::envelope::ErrorMap;

/// Errors returned by [`ServiceClient`](crate::ServiceClient) operations and
/// the response codec.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid service URL '{url}': {source}")]
    UrlError {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request error: {0}")]
    RequestError(#[source] reqwest::Error),

    #[error("Failed to read response body: {0}")]
    ReadError(#[source] reqwest::Error),

    #[error("Failed to unmarshal response body: {0}")]
    UnmarshalError(#[from] serde_json::Error),

    #[error("Service returned status {status}")]
    StatusError { status: u16, errors: ErrorMap },
}

impl ClientError {
    /// HTTP status attached to the error, if the service got far enough to
    /// answer with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::StatusError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Keyed error messages from the response envelope, if any.
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            ClientError::StatusError { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
