//! Query Executor
//!
//! Runs a parsed `QuerySpec` against PostgreSQL. Statements are rendered with
//! `$n` placeholders and every value is bound. Names that end up in the SQL
//! text (table, fields, sort keys, filter names) must be plain identifiers.

use qk_core::PlaceholderStyle;
use qk_queries::render;
use qk_queries::{QuerySpec, Statement, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgPool};

use crate::error::{DbError, DbResult};
use crate::page::Page;

/// Executes query specs against one pool
pub struct QueryExecutor<'a> {
    pool: &'a PgPool,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the rows selected by the spec
    pub async fn fetch_all<T>(&self, spec: &QuerySpec, table: &str) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let statement = select_statement(spec, table)?;
        tracing::debug!(sql = %statement.sql, args = statement.args.len(), "Executing select");

        let rows = sqlx::query_as_with::<_, T, _>(&statement.sql, bind_args(&statement.args))
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Count the rows matching the spec's filters
    pub async fn count(&self, spec: &QuerySpec, table: &str) -> DbResult<i64> {
        let statement = count_statement(spec, table)?;
        tracing::debug!(sql = %statement.sql, args = statement.args.len(), "Executing count");

        let total = sqlx::query_scalar_with::<_, i64, _>(&statement.sql, bind_args(&statement.args))
            .fetch_one(self.pool)
            .await?;
        Ok(total)
    }

    /// Fetch one page together with the total number of matching rows
    pub async fn fetch_page<T>(&self, spec: &QuerySpec, table: &str) -> DbResult<Page<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let total = self.count(spec, table).await?;
        let items = self.fetch_all(spec, table).await?;
        Ok(Page::new(items, total, spec.limit, spec.offset))
    }
}

/// Bind values in placeholder order
pub fn bind_args(args: &[Value]) -> PgArguments {
    let mut arguments = PgArguments::default();
    for arg in args {
        match arg {
            Value::Int(i) => arguments.add(*i),
            Value::Bool(b) => arguments.add(*b),
            Value::Text(s) => arguments.add(s.clone()),
        }
    }
    arguments
}

/// SELECT statement with `$n` placeholders (standalone function for testing)
pub fn select_statement(spec: &QuerySpec, table: &str) -> DbResult<Statement> {
    check_table(table)?;
    check_names(spec)?;
    Ok(render::statement_with(spec, table, PlaceholderStyle::Dollar))
}

/// COUNT statement with `$n` placeholders (standalone function for testing)
pub fn count_statement(spec: &QuerySpec, table: &str) -> DbResult<Statement> {
    check_table(table)?;
    check_names(spec)?;
    Ok(render::count_statement(spec, table, PlaceholderStyle::Dollar))
}

pub fn check_table(table: &str) -> DbResult<()> {
    if is_identifier(table) {
        Ok(())
    } else {
        Err(DbError::InvalidTable(table.to_string()))
    }
}

/// Check every field, sort key and filter name of the spec
pub fn check_names(spec: &QuerySpec) -> DbResult<()> {
    let names = spec
        .fields
        .iter()
        .map(String::as_str)
        .chain(spec.sorts.iter().map(|s| s.by.as_str()))
        .chain(spec.filters.iter().map(|f| f.name.as_str()));

    for name in names {
        if !is_identifier(name) {
            tracing::warn!(name = %name, "Rejected identifier");
            return Err(DbError::InvalidIdentifier(name.to_string()));
        }
    }
    Ok(())
}

/// Plain, optionally qualified identifier such as `users.created_at`
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qk_queries::validations::Validations;
    use qk_queries::QueryParams;

    fn spec(query: &str) -> QuerySpec {
        let rules = Validations::new()
            .allow("name")
            .allow("age:int")
            .allow("active:bool")
            .allow("deleted_at");
        QuerySpec::parse_from(QueryParams::from_query_str(query), rules).unwrap()
    }

    #[test]
    fn test_select_uses_numbered_placeholders() {
        let statement = select_statement(
            &spec("name:ILIKE=jo*&age:IN=20,30&active=true&sort=-age&limit=10&offset=20"),
            "public.users",
        )
        .unwrap();

        assert_eq!(
            statement.sql,
            "SELECT * FROM public.users WHERE name ILIKE $1 AND age IN ($2, $3) AND active = $4 ORDER BY age DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            statement.args,
            vec![
                Value::from("jo%"),
                Value::Int(20),
                Value::Int(30),
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_count_statement() {
        let statement = count_statement(&spec("deleted_at=NULL&age:GT=3&limit=5"), "users").unwrap();
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL AND age > $1"
        );
        assert_eq!(statement.args, vec![Value::Int(3)]);
    }

    #[test]
    fn test_check_table() {
        assert!(check_table("users").is_ok());
        assert!(check_table("app.user_accounts2").is_ok());
        assert!(check_table("_tmp").is_ok());

        for table in ["", "users;drop", "1users", "users ", "app.", "a b"] {
            assert!(
                matches!(check_table(table), Err(DbError::InvalidTable(_))),
                "{table:?} accepted"
            );
        }
    }

    #[test]
    fn test_injected_names_are_rejected() {
        let rules = Validations::new().allow("name");
        let cases = [
            ("sort=id;DROP TABLE users--", "id;DROP TABLE users--"),
            ("fields=(select password from admins) as x", "(select password from admins) as x"),
            ("fields=id,name&name=a&sort=-created_at,x y", "x y"),
        ];

        for (query, bad) in cases {
            let spec = QuerySpec::parse_from(QueryParams::from_query_str(query), rules.clone());
            let spec = match spec {
                Ok(spec) => spec,
                Err(e) => panic!("{query:?} did not parse: {e}"),
            };
            for result in [select_statement(&spec, "users"), count_statement(&spec, "users")] {
                assert!(
                    matches!(result, Err(DbError::InvalidIdentifier(ref name)) if name == bad),
                    "{query:?} accepted"
                );
            }
        }
    }

    #[test]
    fn test_renamed_filter_names_are_checked() {
        let mut spec = spec("name=a&sort=users.name&fields=users.id");
        assert!(select_statement(&spec, "users").is_ok());

        let mut names = std::collections::HashMap::new();
        names.insert("name".to_string(), "lower(name)".to_string());
        spec.replace_filter_names(&names);
        assert!(matches!(
            select_statement(&spec, "users"),
            Err(DbError::InvalidIdentifier(ref name)) if name == "lower(name)"
        ));
    }

    #[test]
    fn test_invalid_table_is_rejected_before_rendering() {
        assert!(select_statement(&QuerySpec::new(), "users--").is_err());
        assert!(count_statement(&QuerySpec::new(), "").is_err());
    }
}
