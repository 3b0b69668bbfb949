//! # qk-db
//!
//! PostgreSQL execution of querykit statements using SQLx.
//!
//! - Connection pool management
//! - Binding of rendered arguments
//! - SELECT, COUNT and paginated fetches for a parsed `QuerySpec`
//!
//! ## Example
//!
//! ```ignore
//! use qk_db::{Database, DatabaseConfig, QueryExecutor};
//!
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//! let page = QueryExecutor::new(db.pool())
//!     .fetch_page::<UserRow>(&spec, "users")
//!     .await?;
//! ```

pub mod error;
pub mod page;
pub mod pool;
pub mod query_executor;

// Re-exports
pub use error::{DbError, DbResult};
pub use page::Page;
pub use pool::{Database, DatabaseConfig};
pub use query_executor::{bind_args, QueryExecutor};
