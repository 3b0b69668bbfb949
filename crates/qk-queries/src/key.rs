//! Query Keys
//!
//! A filter key is `<field>` or `<field>:<method>`, e.g. `age:GTE`.

use qk_core::{QueryError, QueryResult};

/// Comparison methods a filter key can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Equals (=)
    Eq,
    /// Not equals (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than or equal (<=)
    Lte,
    /// Pattern match (LIKE)
    Like,
    /// Case-insensitive pattern match (ILIKE)
    ILike,
    /// IS NOT
    Not,
    /// Member of a list (IN)
    In,
}

impl Method {
    /// Parse method from its key suffix, ignoring case
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQ" => Some(Self::Eq),
            "NE" => Some(Self::Ne),
            "GT" => Some(Self::Gt),
            "LT" => Some(Self::Lt),
            "GTE" => Some(Self::Gte),
            "LTE" => Some(Self::Lte),
            "LIKE" => Some(Self::Like),
            "ILIKE" => Some(Self::ILike),
            "NOT" => Some(Self::Not),
            "IN" => Some(Self::In),
            _ => None,
        }
    }

    /// Key suffix for this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Gte => "GTE",
            Self::Lte => "LTE",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::Not => "NOT",
            Self::In => "IN",
        }
    }

    /// SQL operator text
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::Not => "IS NOT",
            Self::In => "IN",
        }
    }

    /// Whether the value is a delimited list rather than a scalar
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::In)
    }

    /// Whether the `NULL` sentinel is accepted as value
    pub fn accepts_null(&self) -> bool {
        matches!(self, Self::Eq | Self::Not)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a raw query key into field name and method
pub fn parse_key(raw: &str) -> QueryResult<(String, Method)> {
    let (field, method) = match raw.split_once(':') {
        Some((field, suffix)) => {
            let method = Method::from_str(suffix).ok_or_else(|| QueryError::UnknownMethod {
                key: raw.to_string(),
                method: suffix.to_string(),
            })?;
            (field, method)
        }
        None => (raw, Method::Eq),
    };

    if field.is_empty() {
        return Err(QueryError::bad_format(raw));
    }

    Ok((field.to_string(), method))
}
