use thiserror::Error;

/// Failures raised while talking to the content API or reading its items.
///
/// During the fetch loop these are caught and reported alongside the records
/// collected so far; only authentication failures reach the caller directly.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication rejected: {0}")]
    Rejected(String),

    #[error("malformed {kind} item: {reason}")]
    MalformedItem { kind: &'static str, reason: String },
}

/// Errors that abort an extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("mode must be 'submission' or 'comment', got '{0}'")]
    InvalidMode(String),

    #[error("authentication failed: {0}")]
    Auth(#[source] FetchError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
