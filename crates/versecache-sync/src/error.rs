//! Error types for the sync module.

use thiserror::Error;

/// Maximum length of a response body quoted in an error.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors from a [`Source`](crate::Source) fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Nothing is published at the URL.
    #[error("no document at {0}")]
    NotFound(String),
}

impl FetchError {
    /// Map a non-success status and its body to an error.
    pub fn from_status(url: &str, status: u16, body: &str) -> Self {
        match status {
            404 => FetchError::NotFound(url.to_string()),
            _ => FetchError::Status {
                status,
                body: truncate_body(body),
            },
        }
    }

    /// The HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::NotFound(_) => Some(404),
            FetchError::Network(_) => None,
        }
    }
}

/// Truncate a response body to avoid logging excessive data.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..end],
        body.len()
    )
}

/// Coarse classification of a failed sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Fetch,
    Parse,
    Fingerprint,
    Storage,
    Rejected,
    Busy,
}

/// Errors that can occur during a sync attempt.
///
/// Every variant leaves the store exactly as it was before the attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote document could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The remote document is not a snapshot.
    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// The remote snapshot breaks a numbering or uniqueness rule.
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] versecache_core::ValidationError),

    /// The remote snapshot has no canonical encoding.
    #[error("fingerprint failed: {0}")]
    Fingerprint(#[from] versecache_core::CoreError),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] versecache_store::StoreError),

    /// The remote snapshot was refused by a configured guard.
    #[error("snapshot rejected: {0}")]
    Rejected(String),

    /// Another attempt holds the coordinator.
    #[error("a sync is already in progress")]
    InProgress,
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Fetch(_) => FailureKind::Fetch,
            SyncError::Parse(_) | SyncError::Invalid(_) => FailureKind::Parse,
            SyncError::Fingerprint(_) => FailureKind::Fingerprint,
            SyncError::Store(_) => FailureKind::Storage,
            SyncError::Rejected(_) => FailureKind::Rejected,
            SyncError::InProgress => FailureKind::Busy,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(
            FetchError::from_status("http://x/books.json", 404, "gone"),
            FetchError::NotFound("http://x/books.json".into())
        );

        let err = FetchError::from_status("http://x", 500, "boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_long_body_truncated() {
        let body = "é".repeat(400);
        let FetchError::Status { body: truncated, .. } = FetchError::from_status("u", 502, &body)
        else {
            panic!("expected status error");
        };
        assert!(truncated.len() < body.len());
        assert!(truncated.ends_with("(truncated, 800 total bytes)"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(SyncError::InProgress.kind(), FailureKind::Busy);
        assert_eq!(
            SyncError::Fetch(FetchError::Network("refused".into())).kind(),
            FailureKind::Fetch
        );
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(SyncError::Parse(parse).kind(), FailureKind::Parse);
        assert_eq!(
            SyncError::Invalid(versecache_core::ValidationError::DuplicateBook(1)).kind(),
            FailureKind::Parse
        );
    }
}
