//! Error types for locator parsing and validation.

use thiserror::Error;

/// Errors produced while parsing or consuming a locator.
///
/// Every variant describes a problem with the text supplied by the caller,
/// so all of them map to client errors in the surrounding API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// The locator text was empty where a locator is required.
    #[error("empty locator is not supported")]
    Empty,

    /// The locator text does not follow the locator grammar.
    #[error("bad locator syntax at position {position} in '{locator}': {reason}")]
    Syntax {
        locator: String,
        position: usize,
        reason: String,
    },

    /// A dimension value could not be converted to the type the dimension expects.
    #[error("invalid value '{value}' for dimension '{dimension}': expected {expected}")]
    InvalidValue {
        dimension: String,
        value: String,
        expected: String,
    },

    /// Dimensions were present in the locator but never read.
    #[error(
        "locator dimension(s) [{}] are unknown or were not used in '{locator}'{}",
        .names.join(", "),
        supported_suffix(.supported)
    )]
    UnusedDimensions {
        locator: String,
        names: Vec<String>,
        supported: Vec<String>,
    },

    /// The locator is a single value but the consumer only understands dimensions.
    #[error("single value locator '{locator}' is not supported here{}", supported_suffix(.supported))]
    UnsupportedSingleValue {
        locator: String,
        supported: Vec<String>,
    },
}

fn supported_suffix(supported: &[String]) -> String {
    if supported.is_empty() {
        String::new()
    } else {
        format!("; supported dimensions: [{}]", supported.join(", "))
    }
}

impl LocatorError {
    /// Create a syntax error at the given byte position.
    pub fn syntax(locator: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            locator: locator.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Create a value conversion error.
    pub fn invalid_value(
        dimension: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            dimension: dimension.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Result type for locator operations.
pub type Result<T> = std::result::Result<T, LocatorError>;
