//! Query Filters
//!
//! A filter is one `<name> <operator> <value>` condition of the WHERE clause.
//! Filters keep the order in which they were appended; contiguous runs of
//! OR-group filters are rendered as one parenthesized group.

use std::collections::HashMap;

use qk_core::{PlaceholderStyle, QueryError, QueryResult};

use crate::key::{parse_key, Method};
use crate::validations::Validations;
use crate::value::{like_pattern, FilterValue, Value, ValueKind, NULL};

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column the condition applies to
    pub name: String,
    pub method: Method,
    pub value: FilterValue,
    /// Member of a contiguous OR run
    pub or_group: bool,
}

impl Filter {
    /// Create a new filter
    pub fn new(name: impl Into<String>, method: Method, value: impl Into<FilterValue>) -> Self {
        Self {
            name: name.into(),
            method,
            value: value.into(),
            or_group: false,
        }
    }

    /// Create an `IS NULL` filter
    pub fn is_null(name: impl Into<String>) -> Self {
        Self::new(name, Method::Eq, FilterValue::Null)
    }

    /// Create an `IS NOT NULL` filter
    pub fn is_not_null(name: impl Into<String>) -> Self {
        Self::new(name, Method::Not, FilterValue::Null)
    }

    /// Mark the filter as member of an OR group
    pub fn or(mut self) -> Self {
        self.or_group = true;
        self
    }

    /// Build a filter from a raw query key and value
    ///
    /// Returns `Ok(None)` when the field has no registry entry and unknown
    /// filters are ignored.
    pub fn build(
        key: &str,
        raw: &str,
        validations: &Validations,
        list_delimiter: char,
        ignore_unknown: bool,
    ) -> QueryResult<Option<Self>> {
        let (name, method) = parse_key(key)?;

        let rule = match validations.lookup(&name) {
            Some(rule) => rule,
            None if ignore_unknown => {
                tracing::debug!(field = %name, "Unknown filter skipped");
                return Ok(None);
            }
            None => return Err(QueryError::unknown_filter(name)),
        };

        let value = convert(key, method, raw, rule.key.kind, list_delimiter)?;
        for v in value.values() {
            rule.check(v)?;
        }

        Ok(Some(Self {
            name,
            method,
            value,
            or_group: false,
        }))
    }

    /// Render the condition, binding its values
    pub fn render(&self, binder: &mut Binder) -> String {
        if self.value.is_null() {
            return match self.method {
                Method::Not | Method::Ne => format!("{} IS NOT NULL", self.name),
                _ => format!("{} IS NULL", self.name),
            };
        }

        let values = self.value.values();
        if values.is_empty() {
            // an empty list matches nothing
            return "1 = 0".to_string();
        }

        match self.method {
            Method::In => {
                let placeholders: Vec<String> = values.iter().map(|v| binder.bind(v)).collect();
                format!("{} IN ({})", self.name, placeholders.join(", "))
            }
            Method::Eq
            | Method::Ne
            | Method::Gt
            | Method::Lt
            | Method::Gte
            | Method::Lte
            | Method::Like
            | Method::ILike
            | Method::Not => {
                format!("{} {} {}", self.name, self.method.as_sql(), binder.bind(&values[0]))
            }
        }
    }
}

/// Collects bound values and hands out their placeholders
#[derive(Debug, Clone)]
pub struct Binder {
    style: PlaceholderStyle,
    first_index: usize,
    args: Vec<Value>,
}

impl Binder {
    /// Numbered placeholders start at `first_index`
    pub fn new(style: PlaceholderStyle, first_index: usize) -> Self {
        Self {
            style,
            first_index,
            args: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder
    pub fn bind(&mut self, value: &Value) -> String {
        self.args.push(value.clone());
        self.style.placeholder(self.first_index + self.args.len() - 1)
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }
}

/// Convert a raw value to the shape the method expects
fn convert(
    key: &str,
    method: Method,
    raw: &str,
    kind: ValueKind,
    list_delimiter: char,
) -> QueryResult<FilterValue> {
    if raw == NULL && method.accepts_null() {
        return Ok(FilterValue::Null);
    }

    if method.takes_list() {
        let values = raw
            .split(list_delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| kind.convert(s).ok_or_else(|| QueryError::bad_format(key)))
            .collect::<QueryResult<Vec<Value>>>()?;
        if values.is_empty() {
            return Err(QueryError::bad_format(key));
        }
        return Ok(FilterValue::List(values));
    }

    let value = match (method, kind) {
        (Method::Like | Method::ILike, ValueKind::String) => Value::Text(like_pattern(raw)),
        _ => kind.convert(raw).ok_or_else(|| QueryError::bad_format(key))?,
    };
    Ok(FilterValue::Single(value))
}

/// Ordered collection of filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

/// Position of the WHERE renderer relative to an OR group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    Outside,
    Inside,
}

impl FilterSet {
    /// Create a new empty filter set
    pub fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a filter to the set
    pub fn add(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Add a filter and return self (builder pattern)
    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Get all filters
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// First filter with the given name
    pub fn get(&self, name: &str) -> QueryResult<&Filter> {
        self.filters
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| QueryError::not_found(name))
    }

    /// Check if a specific field is being filtered
    pub fn has(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }

    /// Remove the first filter with the given name
    pub fn remove(&mut self, name: &str) -> QueryResult<Filter> {
        let index = self
            .filters
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| QueryError::not_found(name))?;
        Ok(self.filters.remove(index))
    }

    /// Rename filters by a current name → new name map
    ///
    /// Each filter is renamed at most once, so `a → b, b → c` does not turn
    /// `a` into `c`.
    pub fn rename(&mut self, names: &HashMap<String, String>) {
        for filter in &mut self.filters {
            if let Some(new_name) = names.get(&filter.name) {
                filter.name = new_name.clone();
            }
        }
    }

    /// Render the WHERE expression (without the keyword) and its arguments
    ///
    /// Placeholders are numbered from `first_index` for numbered styles.
    pub fn render(&self, style: PlaceholderStyle, first_index: usize) -> (String, Vec<Value>) {
        let mut binder = Binder::new(style, first_index);
        let sql = self.render_with(&mut binder);
        (sql, binder.into_args())
    }

    /// Render the WHERE expression through a shared binder
    pub fn render_with(&self, binder: &mut Binder) -> String {
        let mut sql = String::new();
        let mut state = GroupState::Outside;

        for (i, filter) in self.filters.iter().enumerate() {
            let next_continues = self
                .filters
                .get(i + 1)
                .map(|next| next.or_group)
                .unwrap_or(false);

            let (prefix, close) = match (state, filter.or_group) {
                (GroupState::Outside, true) => {
                    state = GroupState::Inside;
                    (if i == 0 { "(" } else { " AND (" }, !next_continues)
                }
                (GroupState::Inside, true) => (" OR ", !next_continues),
                (_, false) => {
                    state = GroupState::Outside;
                    (if i == 0 { "" } else { " AND " }, false)
                }
            };

            sql.push_str(prefix);
            sql.push_str(&filter.render(binder));
            if close {
                sql.push(')');
                state = GroupState::Outside;
            }
        }

        sql
    }

    /// Arguments in placeholder order
    pub fn args(&self) -> Vec<Value> {
        self.render(PlaceholderStyle::Question, 1).1
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validations::{self, Validations};
    use qk_core::RuleError;

    fn rules() -> Validations {
        Validations::new()
            .allow("name")
            .allow("status")
            .rule("age:int", validations::min(0))
            .allow("id:int")
            .allow("active:bool")
            .allow("deleted_at")
    }

    fn build(key: &str, raw: &str) -> QueryResult<Option<Filter>> {
        Filter::build(key, raw, &rules(), ',', false)
    }

    fn render(set: &FilterSet) -> (String, Vec<Value>) {
        set.render(PlaceholderStyle::Question, 1)
    }

    #[test]
    fn test_build_typed_filter() {
        let filter = build("age:GTE", "18").unwrap().unwrap();
        assert_eq!(filter.name, "age");
        assert_eq!(filter.method, Method::Gte);
        assert_eq!(filter.value, FilterValue::single(18));
        assert!(!filter.or_group);

        let filter = build("name", "John").unwrap().unwrap();
        assert_eq!(filter.method, Method::Eq);
        assert_eq!(filter.value, FilterValue::single("John"));

        let filter = build("active", "true").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::single(true));
    }

    #[test]
    fn test_build_in_list() {
        let filter = build("id:IN", "3, 1,,2").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::list([3, 1, 2]));

        assert!(matches!(build("id:IN", ","), Err(QueryError::BadFormat { .. })));
        assert!(matches!(build("id:IN", "1,x"), Err(QueryError::BadFormat { .. })));
    }

    #[test]
    fn test_build_in_list_validates_each_element() {
        assert!(build("age:IN", "1,5").is_ok());
        assert!(matches!(
            build("age:IN", "1,-5"),
            Err(QueryError::Validation { ref field, source: RuleError::BelowMin { min: 0 } }) if field == "age"
        ));
    }

    #[test]
    fn test_build_null_sentinel() {
        let filter = build("deleted_at:NOT", "NULL").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::Null);

        let filter = build("age", "NULL").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::Null);

        // only EQ and NOT know the sentinel
        assert!(matches!(build("age:GT", "NULL"), Err(QueryError::BadFormat { .. })));
        let filter = build("name:NE", "NULL").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::single("NULL"));
    }

    #[test]
    fn test_build_like_wildcards() {
        let filter = build("name:LIKE", "*oh*").unwrap().unwrap();
        assert_eq!(filter.value, FilterValue::single("%oh%"));
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            build("email", "a@b.c"),
            Err(QueryError::UnknownFilter { ref field }) if field == "email"
        ));
        assert!(matches!(build("age", "old"), Err(QueryError::BadFormat { ref key }) if key == "age"));
        assert!(matches!(
            build("age", "-1"),
            Err(QueryError::Validation { ref field, .. }) if field == "age"
        ));
        assert!(matches!(build("age:ABOUT", "1"), Err(QueryError::UnknownMethod { .. })));
    }

    #[test]
    fn test_build_ignores_unknown() {
        let filter = Filter::build("email", "a@b.c", &rules(), ',', true).unwrap();
        assert!(filter.is_none());
    }

    #[test]
    fn test_render_and_chain() {
        let set = FilterSet::new()
            .with(Filter::new("name", Method::Eq, FilterValue::single("John")))
            .with(Filter::new("age", Method::Gte, FilterValue::single(18)));

        let (sql, args) = render(&set);
        assert_eq!(sql, "name = ? AND age >= ?");
        assert_eq!(args, vec![Value::from("John"), Value::Int(18)]);
    }

    #[test]
    fn test_render_or_group() {
        let set = FilterSet::new()
            .with(Filter::new("status", Method::Eq, FilterValue::single("active")).or())
            .with(Filter::new("status", Method::Eq, FilterValue::single("banned")).or());
        assert_eq!(render(&set).0, "(status = ? OR status = ?)");
    }

    #[test]
    fn test_render_or_group_between_and_filters() {
        let set = FilterSet::new()
            .with(Filter::new("age", Method::Gt, FilterValue::single(18)))
            .with(Filter::new("status", Method::Eq, FilterValue::single("a")).or())
            .with(Filter::new("status", Method::Eq, FilterValue::single("b")).or())
            .with(Filter::new("status", Method::Eq, FilterValue::single("c")).or())
            .with(Filter::new("name", Method::Like, FilterValue::single("J%")));

        let (sql, args) = render(&set);
        assert_eq!(
            sql,
            "age > ? AND (status = ? OR status = ? OR status = ?) AND name LIKE ?"
        );
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn test_render_separate_or_groups() {
        let set = FilterSet::new()
            .with(Filter::new("a", Method::Eq, FilterValue::single(1)).or())
            .with(Filter::new("b", Method::Eq, FilterValue::single(2)).or())
            .with(Filter::new("c", Method::Eq, FilterValue::single(3)))
            .with(Filter::new("d", Method::Eq, FilterValue::single(4)).or())
            .with(Filter::new("e", Method::Eq, FilterValue::single(5)).or());
        assert_eq!(
            render(&set).0,
            "(a = ? OR b = ?) AND c = ? AND (d = ? OR e = ?)"
        );
    }

    #[test]
    fn test_render_lone_or_filter_is_closed() {
        let set = FilterSet::new()
            .with(Filter::new("a", Method::Eq, FilterValue::single(1)))
            .with(Filter::new("b", Method::Eq, FilterValue::single(2)).or());
        assert_eq!(render(&set).0, "a = ? AND (b = ?)");
    }

    #[test]
    fn test_render_null_binds_nothing() {
        let set = FilterSet::new()
            .with(Filter::is_not_null("deleted_at"))
            .with(Filter::is_null("parent_id"))
            .with(Filter::new("active", Method::Not, FilterValue::single(true)));

        let (sql, args) = render(&set);
        assert_eq!(
            sql,
            "deleted_at IS NOT NULL AND parent_id IS NULL AND active IS NOT ?"
        );
        assert_eq!(args, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_render_in_binds_each_element() {
        let set = FilterSet::new()
            .with(Filter::new("id", Method::In, FilterValue::list([7, 3, 5])))
            .with(Filter::new("name", Method::Eq, FilterValue::single("x")));

        let (sql, args) = render(&set);
        assert_eq!(sql, "id IN (?, ?, ?) AND name = ?");
        assert_eq!(
            args,
            vec![Value::Int(7), Value::Int(3), Value::Int(5), Value::from("x")]
        );

        let empty = FilterSet::new().with(Filter::new("id", Method::In, FilterValue::List(vec![])));
        assert_eq!(render(&empty), ("1 = 0".to_string(), vec![]));
    }

    #[test]
    fn test_render_numbered_placeholders() {
        let set = FilterSet::new()
            .with(Filter::new("id", Method::In, FilterValue::list([1, 2])))
            .with(Filter::is_null("deleted_at"))
            .with(Filter::new("name", Method::ILike, FilterValue::single("%a%")));

        let (sql, _) = set.render(PlaceholderStyle::Dollar, 1);
        assert_eq!(sql, "id IN ($1, $2) AND deleted_at IS NULL AND name ILIKE $3");

        let (sql, _) = set.render(PlaceholderStyle::Dollar, 4);
        assert_eq!(sql, "id IN ($4, $5) AND deleted_at IS NULL AND name ILIKE $6");
    }

    #[test]
    fn test_lookup_remove_rename() {
        let mut set = FilterSet::new()
            .with(Filter::new("a", Method::Gt, FilterValue::single(1)))
            .with(Filter::new("b", Method::Eq, FilterValue::single(2)))
            .with(Filter::new("a", Method::Lt, FilterValue::single(9)));

        assert!(set.has("a"));
        assert_eq!(set.get("a").unwrap().method, Method::Gt);
        assert!(matches!(set.get("z"), Err(QueryError::NotFound { .. })));

        let removed = set.remove("a").unwrap();
        assert_eq!(removed.method, Method::Gt);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a").unwrap().method, Method::Lt);
        assert!(matches!(set.remove("z"), Err(QueryError::NotFound { .. })));

        let mut names = HashMap::new();
        names.insert("a".to_string(), "b".to_string());
        names.insert("b".to_string(), "c".to_string());
        set.rename(&names);
        let renamed: Vec<&str> = set.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(renamed, vec!["c", "b"]);
    }

    #[test]
    fn test_args_shortcut() {
        let set = FilterSet::new()
            .with(Filter::is_null("x"))
            .with(Filter::new("y", Method::Eq, FilterValue::single("v")));
        assert_eq!(set.args(), vec![Value::from("v")]);
    }
}
