//! Error types for statement execution

use qk_core::QueryError;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// A field, sort key or filter name that is not a plain identifier
    #[error("{0}: invalid identifier")]
    InvalidIdentifier(String),
}

impl DbError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Database(sqlx::Error::RowNotFound) => 404,
            Self::Database(_) => 500,
            Self::Query(e) => e.status_code(),
            Self::InvalidTable(_) => 500,
            Self::InvalidIdentifier(_) => 400,
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
