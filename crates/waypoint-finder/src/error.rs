//! Error types for the finder crate.

use thiserror::Error;
use waypoint_locator::LocatorError;

/// How an error should be surfaced to the API caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller sent a query that cannot be honoured (400-class).
    MalformedQuery,
    /// The query was fine but matched nothing (404-class).
    NotFound,
    /// Finder wiring is broken; abort the request, do not retry.
    Internal,
}

/// Errors that can occur when resolving a locator.
#[derive(Debug, Error)]
pub enum FinderError {
    /// The locator text is malformed, has unknown dimensions or bad values.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// A lookup that assumes uniqueness found several items.
    #[error("{matches} items match {dimension} '{value}'; use a more specific locator")]
    Ambiguous {
        dimension: String,
        value: String,
        matches: usize,
    },

    /// Nothing matched a single-item request.
    #[error("nothing is found by locator '{locator}'")]
    NotFound { locator: String },

    /// A programming error in how a finder was assembled or used.
    #[error("internal finder error: {0}")]
    Internal(String),

    /// Finder settings could not be loaded.
    #[error("invalid finder settings: {0}")]
    Settings(#[from] serde_yaml::Error),
}

impl FinderError {
    /// Create an ambiguity error.
    pub fn ambiguous(dimension: impl Into<String>, value: impl Into<String>, matches: usize) -> Self {
        Self::Ambiguous {
            dimension: dimension.into(),
            value: value.into(),
            matches,
        }
    }

    /// Create a not-found error.
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::NotFound {
            locator: locator.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classifies the error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Locator(_) | Self::Ambiguous { .. } => ErrorKind::MalformedQuery,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal(_) | Self::Settings(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for finder operations.
pub type Result<T> = std::result::Result<T, FinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            FinderError::from(LocatorError::Empty).kind(),
            ErrorKind::MalformedQuery
        );
        assert_eq!(
            FinderError::ambiguous("name", "B", 2).kind(),
            ErrorKind::MalformedQuery
        );
        assert_eq!(FinderError::not_found("id:1").kind(), ErrorKind::NotFound);
        assert_eq!(FinderError::internal("oops").kind(), ErrorKind::Internal);
    }

    #[test]
    fn messages() {
        assert_eq!(
            FinderError::ambiguous("name", "B", 2).to_string(),
            "2 items match name 'B'; use a more specific locator"
        );
        assert_eq!(
            FinderError::not_found("id:1").to_string(),
            "nothing is found by locator 'id:1'"
        );
        assert_eq!(
            FinderError::from(LocatorError::Empty).to_string(),
            "empty locator is not supported"
        );
    }
}
