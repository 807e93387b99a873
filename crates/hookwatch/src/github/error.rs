//! GitHub API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The credential was rejected (HTTP 401).
    #[error("GitHub rejected the credential (401 Unauthorized)")]
    Unauthorized,

    #[error("GitHub returned status {status} for {url}")]
    StatusNotAccepted { status: u16, url: String },

    #[error("failed to decode GitHub response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GitHubError {
    #[inline]
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::StatusNotAccepted {
            status,
            url: url.into(),
        }
    }

    #[inline]
    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error means the credential is invalid.
    ///
    /// Callers treat this as fatal: retrying on the next tick cannot succeed.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
