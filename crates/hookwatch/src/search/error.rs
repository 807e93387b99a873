use thiserror::Error;

use crate::http::HttpError;

/// Errors from the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no search engine address configured")]
    NoAddress,

    #[error("index {index} does not exist; is the webhook installed?")]
    IndexMissing { index: String },

    #[error("search engine rejected the credentials (401 Unauthorized)")]
    Unauthorized,

    #[error("unexpected status {status} from search engine at {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error(
        "search engine refused document (status {status}, type {}, reason {})",
        .error_type.as_deref().unwrap_or("<none>"),
        .reason.as_deref().unwrap_or("<none>")
    )]
    Rejected {
        status: u16,
        error_type: Option<String>,
        reason: Option<String>,
    },

    #[error("invalid CA certificate: {0}")]
    InvalidCaCert(String),

    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}
