use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::types::FieldKind;

/// Why a raw value could not be converted into a field's declared type.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid integer: {0}")]
    Integer(#[from] ParseIntError),

    #[error("invalid unsigned integer: sign prefix is not allowed")]
    UnsignedSign,

    #[error("invalid float: {0}")]
    Float(#[from] ParseFloatError),

    #[error("float value out of range for a {bits}-bit float")]
    FloatRange { bits: u32 },

    #[error("invalid boolean: expected one of true, false, 1, 0")]
    Bool,

    #[error("parsing time {raw:?} as RFC3339: {source}")]
    Time { raw: String, source: chrono::ParseError },

    /// Error reported by a [`FromText`](crate::convert::FromText) implementation, kept as-is.
    #[error("{message}")]
    Text { message: String },

    #[error("json unmarshal error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported field type {type_name}")]
    UnsupportedType { type_name: &'static str },
}

/// Recoverable failure of a single field assignment.
///
/// The field is left exactly as it was before the call.
#[derive(Debug, Error)]
#[error("failed to assign {value:?} to field {field} ({kind}): {source}")]
pub struct AssignError {
    pub field: String,
    pub value: String,
    pub kind: FieldKind,
    pub source: ConversionError,
}

impl AssignError {
    pub fn new(field: impl Into<String>, value: impl Into<String>, kind: FieldKind, source: ConversionError) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            kind,
            source,
        }
    }

    /// True when the field's type has no textual form at all.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.source, ConversionError::UnsupportedType { .. })
    }
}

/// Collection of validation issues reported by a [`Validate`](crate::validate::Validate) hook.
#[derive(Debug, Error)]
#[error("validation failed: {}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {} ({})", issue.field, issue.message, issue.code))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors returned by [`EnvProcessor::process`](crate::config::EnvProcessor::process).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to assign env var {value} to field {field} ({source})")]
    EnvVar {
        field: String,
        value: String,
        source: AssignError,
    },

    #[error("failed to assign default value {value} to field {field} ({source})")]
    Default {
        field: String,
        value: String,
        source: AssignError,
    },

    #[error("failed while validating the configuration ({0})")]
    Validation(#[source] ValidationError),
}

/// Errors returned by [`params::decode`](crate::params::decode).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to parse json body parameters ({0})")]
    Body(#[source] BodyError),

    #[error("failed to parse query parameters ({0})")]
    Query(#[source] ParameterError),

    #[error("failed to parse header parameters ({0})")]
    Header(#[source] ParameterError),

    #[error("failed to parse path parameters ({0})")]
    Path(#[source] ParameterError),

    #[error("validation failed for request parameters ({0})")]
    Validation(#[source] ValidationError),
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("failed to decode json body ({0})")]
    Json(#[from] serde_json::Error),

    #[error("json body must be an object")]
    NotAnObject,

    #[error("json: unknown field {name:?}")]
    UnknownField { name: String },
}

/// Failure to bind one query, header or path value.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("expecting one value for {origin} parameter {name} but found {values:?}")]
    MultipleValues {
        origin: &'static str,
        name: String,
        values: Vec<String>,
    },

    #[error("{origin} parameter {name} is not valid text")]
    NotText { origin: &'static str, name: String },

    #[error("failed to set value for {origin} parameter {name} with value {value:?} ({source})")]
    Assign {
        origin: &'static str,
        name: String,
        value: String,
        source: AssignError,
    },
}

/// Structural problem in a type's parameter tags. Surfaced as a panic by the binder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("field {field} has more than one source tag ({first} and {second})")]
    MultipleSources {
        field: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("field {field} has an invalid {tag} lookup key {key:?}")]
    InvalidKey {
        field: String,
        tag: &'static str,
        key: String,
    },

    #[error("field {field} is sourced from {tag} and must be tagged json:\"-\"")]
    MissingJsonSkip { field: String, tag: &'static str },

    #[error("{tag} lookup key {key:?} is used by both {first} and {second}")]
    DuplicateKey {
        tag: &'static str,
        key: String,
        first: String,
        second: String,
    },
}
