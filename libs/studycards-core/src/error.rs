//! Error types for studycards-core.

use thiserror::Error;

/// Error returned when parsing a stored or wire enum string fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
