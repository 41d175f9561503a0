use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while parsing, validating or encoding an SLI query.
///
/// Every failure is total: no partially built query is ever returned
/// alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query must not be empty")]
    EmptyInput,
    /// A chunk did not contain exactly one '=' with text on both sides.
    #[error("Could not parse '{0}' as a key=value pair")]
    MalformedPair(String),
    #[error("Unknown key '{0}'")]
    UnknownKey(String),
    #[error("Duplicate key '{0}'")]
    DuplicateKey(String),
    #[error("Missing required field '{0}'")]
    MissingRequiredField(&'static str),
    #[error("Invalid {field} '{value}'")]
    InvalidEnumValue { field: &'static str, value: String },
    /// A USQL dimension was given where it is forbidden, or omitted where it is required.
    #[error("Dimension {reason} for result type {result_type}")]
    DimensionMismatch {
        result_type: String,
        reason: &'static str,
    },
    #[error("Expected {expected} ';'-separated pieces but found {found}")]
    IncorrectPrefix { expected: usize, found: usize },
    #[error("Expected prefix '{expected}' but found '{found}'")]
    UnrecognizedPrefix {
        expected: &'static str,
        found: String,
    },
    /// Two keys were assigned the same position by a key orderer.
    #[error("Keys '{first}' and '{second}' share position {position}")]
    AmbiguousOrdering {
        first: String,
        second: String,
        position: usize,
    },
    #[error("Key '{0}' has no position in the requested ordering")]
    UnexpectedKey(String),
    /// A value would not parse back from the storage form.
    #[error("Value '{value}' of '{field}' cannot be written in the storage form")]
    UnencodableValue { field: &'static str, value: String },
    #[error("Invalid timeframe: start {start} must be before end {end}")]
    InvalidTimeframe {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
