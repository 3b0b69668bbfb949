//! Core error types for querykit
//!
//! Every failure raised while parsing a request query is scoped to the key or
//! field that caused it, so the HTTP-facing caller can name it in a 400 response.

use std::num::ParseIntError;
use thiserror::Error;

use crate::config::ConfigError;

/// Error raised while parsing or manipulating a filter query
#[derive(Error, Debug)]
pub enum QueryError {
    /// A key expected exactly one raw value, a value could not be converted,
    /// or an OR segment is missing its `key=value` separator
    #[error("{key}: bad format")]
    BadFormat { key: String },

    #[error("{key}: unknown method {method}")]
    UnknownMethod { key: String, method: String },

    #[error("{field}: required")]
    RequiredMissing { field: String },

    /// The field has no entry in the validation registry
    #[error("{field}: filter not allowed")]
    UnknownFilter { field: String },

    #[error("{field}: {source}")]
    Validation {
        field: String,
        #[source]
        source: RuleError,
    },

    #[error("{key}: {source}")]
    NumericConversion {
        key: String,
        #[source]
        source: ParseIntError,
    },

    /// Lookup or removal of a filter name that is not present
    #[error("{name}: filter not found")]
    NotFound { name: String },

    #[error("invalid url: {message}")]
    InvalidUrl { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    pub fn bad_format(key: impl Into<String>) -> Self {
        QueryError::BadFormat { key: key.into() }
    }

    pub fn required(field: impl Into<String>) -> Self {
        QueryError::RequiredMissing {
            field: field.into(),
        }
    }

    pub fn unknown_filter(field: impl Into<String>) -> Self {
        QueryError::UnknownFilter {
            field: field.into(),
        }
    }

    pub fn validation(field: impl Into<String>, source: RuleError) -> Self {
        QueryError::Validation {
            field: field.into(),
            source,
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        QueryError::NotFound { name: name.into() }
    }

    /// The key or field the error is scoped to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            QueryError::BadFormat { key }
            | QueryError::UnknownMethod { key, .. }
            | QueryError::NumericConversion { key, .. } => Some(key),
            QueryError::RequiredMissing { field }
            | QueryError::UnknownFilter { field }
            | QueryError::Validation { field, .. } => Some(field),
            QueryError::NotFound { name } => Some(name),
            QueryError::InvalidUrl { .. } | QueryError::Config(_) => None,
        }
    }

    /// HTTP status code a request handler should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::NotFound { .. } => 404,
            QueryError::Config(_) => 500,
            _ => 400,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::BadFormat { .. } => "bad_format",
            QueryError::UnknownMethod { .. } => "unknown_method",
            QueryError::RequiredMissing { .. } => "required",
            QueryError::UnknownFilter { .. } => "filter_not_allowed",
            QueryError::Validation { .. } => "validation_failed",
            QueryError::NumericConversion { .. } => "not_a_number",
            QueryError::NotFound { .. } => "filter_not_found",
            QueryError::InvalidUrl { .. } => "invalid_url",
            QueryError::Config(_) => "invalid_config",
        }
    }
}

/// Rejection reported by a validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("not in scope")]
    NotInScope,

    #[error("must be at least {min}")]
    BelowMin { min: i64 },

    #[error("must be at most {max}")]
    AboveMax { max: i64 },

    #[error("must not be empty")]
    Empty,

    #[error("must be at most {max} characters")]
    TooLong { max: usize },

    #[error("unexpected value type")]
    WrongType,

    #[error("{0}")]
    Message(String),
}
