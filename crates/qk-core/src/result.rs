//! Result type aliases

use crate::error::QueryError;

/// Standard Result type for query parsing operations
pub type QueryResult<T> = Result<T, QueryError>;
