use sentinel_core::error::{ErrorCode, SentinelError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeErrorKind {
    Empty,
    VendorError,
    Network,
    RateLimited,
}

#[derive(Error, Debug)]
#[error("scrape failed ({kind:?}): {message}")]
pub struct ScrapeError {
    pub kind: ScrapeErrorKind,
    pub message: String,
}

impl ScrapeError {
    pub fn new(kind: ScrapeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient errors are worth retrying; `empty` (no content at the URL) is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ScrapeErrorKind::VendorError | ScrapeErrorKind::Network | ScrapeErrorKind::RateLimited
        )
    }
}

impl SentinelError for ScrapeError {
    fn error_code(&self) -> ErrorCode {
        match self.kind {
            ScrapeErrorKind::Empty => ErrorCode::NotFound,
            ScrapeErrorKind::RateLimited => ErrorCode::ResourceExhausted,
            ScrapeErrorKind::VendorError | ScrapeErrorKind::Network => ErrorCode::Internal,
        }
    }
}
