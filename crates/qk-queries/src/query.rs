//! Query Specification
//!
//! A `QuerySpec` is built once per request from the decoded query string and
//! the service's validation registry. `parse` fills the projection, pagination,
//! sort list and filters; the service may then add its own constraints before
//! rendering SQL with the functions in [`crate::render`].

use std::collections::HashMap;
use std::num::ParseIntError;

use qk_core::{ParserConfig, QueryError, QueryResult};
use tracing::debug;

use crate::filters::{Filter, FilterSet};
use crate::key::Method;
use crate::params::QueryParams;
use crate::render::{self, Statement};
use crate::sorts::{parse_sorts, split_list, Sort};
use crate::validations::Validations;
use crate::value::{FilterValue, Value};

/// Reserved keys, matched case-insensitively
pub mod reserved {
    pub const FIELDS: &str = "fields";
    pub const OFFSET: &str = "offset";
    pub const LIMIT: &str = "limit";
    pub const SORT: &str = "sort";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservedKey {
    Fields,
    Offset,
    Limit,
    Sort,
}

impl ReservedKey {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            reserved::FIELDS => Some(Self::Fields),
            reserved::OFFSET => Some(Self::Offset),
            reserved::LIMIT => Some(Self::Limit),
            reserved::SORT => Some(Self::Sort),
            _ => None,
        }
    }
}

/// Filter, sort and pagination request for one list endpoint
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Projected fields, empty for all
    pub fields: Vec<String>,
    /// Rows to skip, 0 for none
    pub offset: u64,
    /// Maximum rows, 0 for no limit
    pub limit: u64,
    pub sorts: Vec<Sort>,
    pub filters: FilterSet,
    config: ParserConfig,
    params: QueryParams,
    validations: Validations,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a spec for the given request and registry
    pub fn with(params: QueryParams, validations: Validations) -> Self {
        Self::new().with_params(params).with_validations(validations)
    }

    /// Create a spec and parse it
    pub fn parse_from(params: QueryParams, validations: Validations) -> QueryResult<Self> {
        let mut spec = Self::with(params, validations);
        spec.parse()?;
        Ok(spec)
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_validations(mut self, validations: Validations) -> Self {
        self.validations = validations;
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip filters without a registry entry instead of failing
    pub fn ignore_unknown_filters(mut self, ignore: bool) -> Self {
        self.config.ignore_unknown_filters = ignore;
        self
    }

    /// Replace the request query
    pub fn set_params(&mut self, params: QueryParams) -> &mut Self {
        self.params = params;
        self
    }

    /// Replace the request query from a full URL
    pub fn set_url(&mut self, url: &str) -> QueryResult<&mut Self> {
        self.params = QueryParams::from_url(url)?;
        Ok(self)
    }

    pub fn set_validations(&mut self, validations: Validations) -> &mut Self {
        self.validations = validations;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn validations(&self) -> &Validations {
        &self.validations
    }

    /// Parse the request query
    ///
    /// The configuration and required fields are checked first; if either
    /// fails nothing else is touched. Otherwise existing filters are cleared
    /// and every key is handled in order. The first failure aborts the pass.
    pub fn parse(&mut self) -> QueryResult<()> {
        self.config.validate()?;
        let validations = self.validations.resolve_required(&self.params)?;

        self.filters.clear();

        let params = std::mem::take(&mut self.params);
        let result = params
            .iter()
            .try_for_each(|(key, values)| self.parse_key(key, values, &validations));
        self.params = params;

        if let Err(ref e) = result {
            debug!(error = %e, "Query rejected");
        } else {
            debug!(
                filters = self.filters.len(),
                sorts = self.sorts.len(),
                fields = self.fields.len(),
                limit = self.limit,
                offset = self.offset,
                "Query parsed"
            );
        }

        result
    }

    fn parse_key(&mut self, key: &str, values: &[String], validations: &Validations) -> QueryResult<()> {
        match ReservedKey::from_key(key) {
            Some(ReservedKey::Fields) => self.parse_fields(key, values, validations),
            Some(ReservedKey::Offset) => {
                if let Some(offset) = parse_count(key, values, reserved::OFFSET, validations)? {
                    self.offset = offset;
                }
                Ok(())
            }
            Some(ReservedKey::Limit) => {
                if let Some(limit) = parse_count(key, values, reserved::LIMIT, validations)? {
                    self.limit = limit;
                }
                Ok(())
            }
            Some(ReservedKey::Sort) => self.parse_sort(key, values, validations),
            None => self.parse_filter(key, values, validations),
        }
    }

    fn parse_fields(&mut self, key: &str, values: &[String], validations: &Validations) -> QueryResult<()> {
        let list = split_list(single_value(key, values)?, self.config.list_delimiter);

        if let Some(rule) = validations.lookup(reserved::FIELDS) {
            for field in &list {
                rule.check(&Value::Text(field.clone()))?;
            }
        }

        self.fields = list;
        Ok(())
    }

    fn parse_sort(&mut self, key: &str, values: &[String], validations: &Validations) -> QueryResult<()> {
        let sorts = parse_sorts(key, single_value(key, values)?, self.config.list_delimiter)?;

        if let Some(rule) = validations.lookup(reserved::SORT) {
            for sort in &sorts {
                rule.check(&Value::Text(sort.by.clone()))?;
            }
        }

        self.sorts = sorts;
        Ok(())
    }

    fn parse_filter(&mut self, key: &str, values: &[String], validations: &Validations) -> QueryResult<()> {
        let raw = single_value(key, values)?;
        let list_delimiter = self.config.list_delimiter;
        let ignore_unknown = self.config.ignore_unknown_filters;

        if !raw.contains(self.config.or_delimiter) {
            if let Some(filter) = Filter::build(key, raw, validations, list_delimiter, ignore_unknown)? {
                self.filters.add(filter);
            }
            return Ok(());
        }

        // later segments name their own key: `a=1|b=2`
        for (i, segment) in raw.split(self.config.or_delimiter).enumerate() {
            let (segment_key, segment_value) = if i == 0 {
                (key, segment)
            } else {
                segment
                    .split_once('=')
                    .ok_or_else(|| QueryError::bad_format(key))?
            };

            if let Some(filter) =
                Filter::build(segment_key, segment_value, validations, list_delimiter, ignore_unknown)?
            {
                self.filters.add(filter.or());
            }
        }

        Ok(())
    }

    /// Check if the request asks for a field
    pub fn have_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn add_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.fields.push(field.into());
        self
    }

    /// Check if the request sorts by a field
    pub fn have_sort_by(&self, by: &str) -> bool {
        self.sorts.iter().any(|s| s.by == by)
    }

    /// Check if a field is being filtered
    pub fn have_filter(&self, name: &str) -> bool {
        self.filters.has(name)
    }

    /// Append a server-side filter, AND-ed with the rest
    pub fn add_filter(
        &mut self,
        name: impl Into<String>,
        method: Method,
        value: impl Into<FilterValue>,
    ) -> &mut Self {
        self.filters.add(Filter::new(name, method, value));
        self
    }

    /// Remove the first filter with the given name
    pub fn remove_filter(&mut self, name: &str) -> QueryResult<Filter> {
        self.filters.remove(name)
    }

    /// First filter with the given name
    pub fn filter(&self, name: &str) -> QueryResult<&Filter> {
        self.filters.get(name)
    }

    /// Rename filters from public API names to storage names
    pub fn replace_filter_names(&mut self, names: &HashMap<String, String>) -> &mut Self {
        self.filters.rename(names);
        self
    }

    pub fn fields_sql(&self) -> String {
        render::fields_sql(self)
    }

    pub fn where_sql(&self) -> String {
        render::where_sql(self)
    }

    pub fn args(&self) -> Vec<Value> {
        render::args(self)
    }

    pub fn sort_sql(&self) -> String {
        render::sort_sql(self)
    }

    pub fn limit_sql(&self) -> String {
        render::limit_sql(self)
    }

    pub fn offset_sql(&self) -> String {
        render::offset_sql(self)
    }

    /// Full SELECT statement text for a table
    pub fn sql(&self, table: &str) -> String {
        render::select_sql(self, table)
    }

    /// SELECT statement with its arguments
    pub fn statement(&self, table: &str) -> Statement {
        render::statement(self, table)
    }
}

/// The single raw value of a key that allows exactly one
fn single_value<'a>(key: &str, values: &'a [String]) -> QueryResult<&'a str> {
    match values {
        [value] => Ok(value),
        _ => Err(QueryError::bad_format(key)),
    }
}

/// Parse `offset` or `limit`; `None` when the value is empty
fn parse_count(
    key: &str,
    values: &[String],
    rule_name: &str,
    validations: &Validations,
) -> QueryResult<Option<u64>> {
    let raw = single_value(key, values)?.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let conversion = |source: ParseIntError| QueryError::NumericConversion {
        key: key.to_string(),
        source,
    };
    // the unsigned parse rejects a sign, the signed one bounds the value to BIGINT
    let count = raw.parse::<u64>().map_err(conversion)?;
    let bounded = raw.parse::<i64>().map_err(conversion)?;

    if let Some(rule) = validations.lookup(rule_name) {
        rule.check(&Value::Int(bounded))?;
    }

    Ok(Some(count))
}
