use std::fmt;

use drift_query::PathError;

/// Configuration or sequencing error raised by a paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The base query carries no `limit`; the page size comes from it.
    MissingLimit,
    /// Cursor pagination requires at least one `order` on the base query.
    MissingOrder,
    /// A page was requested out of sequence; pages are strictly appended.
    Gap { requested: usize, next: usize },
    Path(PathError),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::MissingLimit => write!(f, "base query has no limit to page by"),
            PageError::MissingOrder => write!(f, "cursor pagination requires an ordered query"),
            PageError::Gap { requested, next } => {
                write!(f, "page {requested} requested but next page is {next}")
            }
            PageError::Path(e) => write!(f, "cursor path: {e}"),
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageError::Path(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathError> for PageError {
    fn from(e: PathError) -> Self {
        PageError::Path(e)
    }
}

/// A failed page request, surfaced to the caller. The page log is left at
/// its last successful boundary and remains resumable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "fetch failed ({status}): {}", self.message),
            None => write!(f, "fetch failed: {}", self.message),
        }
    }
}

impl std::error::Error for FetchError {}
