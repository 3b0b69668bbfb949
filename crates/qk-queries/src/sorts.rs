//! Query Sort Orders
//!
//! The `sort` key holds a delimited list of fields, each optionally prefixed
//! with `-` (descending) or `+` (ascending, the default).

use qk_core::{QueryError, QueryResult};

/// A single sort criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field to sort by
    pub by: String,
    pub desc: bool,
}

impl Sort {
    /// Create ascending sort
    pub fn asc(by: impl Into<String>) -> Self {
        Self {
            by: by.into(),
            desc: false,
        }
    }

    /// Create descending sort
    pub fn desc(by: impl Into<String>) -> Self {
        Self {
            by: by.into(),
            desc: true,
        }
    }

    /// Parse one list element such as `-created_at`
    pub fn parse(element: &str) -> Option<Self> {
        let sort = match element.strip_prefix('-') {
            Some(by) => Self::desc(by),
            None => Self::asc(element.strip_prefix('+').unwrap_or(element)),
        };

        if sort.by.is_empty() {
            None
        } else {
            Some(sort)
        }
    }

    /// ORDER BY term
    pub fn to_sql(&self) -> String {
        if self.desc {
            format!("{} DESC", self.by)
        } else {
            self.by.clone()
        }
    }
}

/// Split a delimited list, trimming elements and dropping empty ones
pub fn split_list(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the value of a `sort` key
pub fn parse_sorts(key: &str, raw: &str, delimiter: char) -> QueryResult<Vec<Sort>> {
    split_list(raw, delimiter)
        .iter()
        .map(|element| Sort::parse(element).ok_or_else(|| QueryError::bad_format(key)))
        .collect()
}
