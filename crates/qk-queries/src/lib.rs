//! # qk-queries
//!
//! Turns a URL query string into a validated filter, sort and pagination
//! request and renders it as parameterized SQL.
//!
//! ## Structure
//!
//! - `key` - `field[:METHOD]` query keys and comparison methods
//! - `value` - Typed values and the `NULL` sentinel
//! - `params` - Decoded query parameters
//! - `validations` - Registry of allowed fields, type hints and validators
//! - `filters` - Filter conditions and the WHERE renderer
//! - `sorts` - Sort criteria
//! - `query` - The `QuerySpec` aggregate and its parser
//! - `render` - SQL fragments and full statements
//!
//! ## Example
//!
//! ```
//! use qk_queries::validations::{self, Validations};
//! use qk_queries::{QueryParams, QuerySpec, Value};
//!
//! let rules = Validations::new()
//!     .allow("name")
//!     .rule("age:int", validations::min(0))
//!     .allow("status");
//!
//! let params = QueryParams::from_query_str("name=John&age:GTE=18&status=a|status=b&sort=-age&limit=10");
//! let spec = QuerySpec::parse_from(params, rules).unwrap();
//!
//! assert_eq!(
//!     spec.sql("users"),
//!     "SELECT * FROM users WHERE name = ? AND age >= ? AND (status = ? OR status = ?) ORDER BY age DESC LIMIT 10"
//! );
//! assert_eq!(spec.args()[1], Value::Int(18));
//! ```

pub mod filters;
pub mod key;
pub mod params;
pub mod query;
pub mod render;
pub mod sorts;
pub mod validations;
pub mod value;

// Re-exports for convenience
pub use filters::{Binder, Filter, FilterSet};
pub use key::Method;
pub use params::QueryParams;
pub use query::QuerySpec;
pub use render::Statement;
pub use sorts::Sort;
pub use validations::{Rule, RuleKey, ValidationFn, Validations};
pub use value::{FilterValue, Value, ValueKind, NULL};
