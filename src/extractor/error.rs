//! Error types for the extractor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A configured CSS selector does not parse
    #[error("invalid selector '{selector}': {reason}")]
    Selector {
        /// Selector as configured
        selector: String,
        /// Parser message
        reason: String,
    },

    /// A field the record cannot exist without was not found
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        CrateError::Extract(err.to_string())
    }
}
