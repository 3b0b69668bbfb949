//! SQL Rendering
//!
//! Standalone functions turning a parsed [`QuerySpec`] into SQL fragments.
//! Only values are ever bound; field names and the table are written as-is
//! and must come from the validation registry or the service itself.

use qk_core::PlaceholderStyle;
use serde::Serialize;

use crate::filters::Binder;
use crate::query::QuerySpec;
use crate::value::Value;

/// SQL text with its positional arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Projection list, `*` when no fields were requested
pub fn fields_sql(spec: &QuerySpec) -> String {
    if spec.fields.is_empty() {
        "*".to_string()
    } else {
        spec.fields.join(", ")
    }
}

/// WHERE expression without the keyword, empty when there are no filters
pub fn where_clause(spec: &QuerySpec, style: PlaceholderStyle) -> (String, Vec<Value>) {
    spec.filters.render(style, 1)
}

/// ` WHERE ...` using the configured placeholder style
pub fn where_sql(spec: &QuerySpec) -> String {
    with_keyword(" WHERE ", where_clause(spec, spec.config().placeholder).0)
}

/// Arguments in placeholder order
pub fn args(spec: &QuerySpec) -> Vec<Value> {
    spec.filters.args()
}

/// ` ORDER BY ...`, empty without sorts
pub fn sort_sql(spec: &QuerySpec) -> String {
    let terms: Vec<String> = spec.sorts.iter().map(|s| s.to_sql()).collect();
    with_keyword(" ORDER BY ", terms.join(", "))
}

/// ` LIMIT n`, empty for 0
pub fn limit_sql(spec: &QuerySpec) -> String {
    if spec.limit > 0 {
        format!(" LIMIT {}", spec.limit)
    } else {
        String::new()
    }
}

/// ` OFFSET n`, empty for 0
pub fn offset_sql(spec: &QuerySpec) -> String {
    if spec.offset > 0 {
        format!(" OFFSET {}", spec.offset)
    } else {
        String::new()
    }
}

/// Full SELECT text using the configured placeholder style
pub fn select_sql(spec: &QuerySpec, table: &str) -> String {
    statement(spec, table).sql
}

/// SELECT statement using the configured placeholder style
pub fn statement(spec: &QuerySpec, table: &str) -> Statement {
    statement_with(spec, table, spec.config().placeholder)
}

/// SELECT statement with an explicit placeholder style
pub fn statement_with(spec: &QuerySpec, table: &str, style: PlaceholderStyle) -> Statement {
    let mut binder = Binder::new(style, 1);
    let filters = spec.filters.render_with(&mut binder);

    let sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        fields_sql(spec),
        table,
        with_keyword(" WHERE ", filters),
        sort_sql(spec),
        limit_sql(spec),
        offset_sql(spec),
    );

    Statement {
        sql,
        args: binder.into_args(),
    }
}

/// `SELECT COUNT(*)` over the filtered rows, ignoring sorts and pagination
pub fn count_statement(spec: &QuerySpec, table: &str, style: PlaceholderStyle) -> Statement {
    let (filters, args) = where_clause(spec, style);
    Statement {
        sql: format!("SELECT COUNT(*) FROM {}{}", table, with_keyword(" WHERE ", filters)),
        args,
    }
}

fn with_keyword(keyword: &str, body: String) -> String {
    if body.is_empty() {
        body
    } else {
        format!("{}{}", keyword, body)
    }
}
