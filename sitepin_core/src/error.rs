use thiserror::Error;

/// Failure of a single call against the storage node.
///
/// Payloads are plain strings so the error can be cloned into reports and
/// replayed by test backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("could not reach node: {0}")]
    Transport(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("node answered HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("unexpected response from node: {0}")]
    Decode(String),

    #[error("local filesystem error: {0}")]
    Local(String),
}

impl ApiError {
    /// True when the node reported that the requested thing does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors of content store operations (add, pin, unpin, remove).
pub type StoreError = ApiError;

/// Errors of name service operations (resolve, publish).
pub type NameServiceError = ApiError;
