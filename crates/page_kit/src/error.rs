//! Error types surfaced by page operations.

use dom::DomError;
use thiserror::Error;

use crate::fonts::FontLoadError;

/// Failure of a [`PageContext`](crate::PageContext) operation.
#[derive(Debug, Error)]
pub enum PageError {
    /// Caller input that cannot describe a valid operation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A font face could not be fetched or decoded.
    #[error(transparent)]
    FontLoad(#[from] FontLoadError),
    /// The document rejected a query or mutation.
    #[error(transparent)]
    Dom(#[from] DomError),
}
