//! Configuration types and loading
//!
//! Parser behaviour that a service may want to tune per deployment.

use serde::{Deserialize, Serialize};

/// Placeholder syntax used when rendering bound values
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `?` for every value (MySQL, SQLite, database/sql style drivers)
    #[default]
    Question,
    /// `$1`, `$2`, ... numbered across the statement (PostgreSQL)
    Dollar,
}

impl PlaceholderStyle {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "question" | "?" => Some(Self::Question),
            "dollar" | "$" | "postgres" => Some(Self::Dollar),
            _ => None,
        }
    }

    /// Placeholder text for the value at `index` (1-based)
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", index),
        }
    }
}

/// Query parser configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    /// Separates list elements in `fields`, `sort` and `IN` values
    pub list_delimiter: char,
    /// Separates the segments of an OR group inside one value
    pub or_delimiter: char,
    /// Skip filters without a registry entry instead of failing
    pub ignore_unknown_filters: bool,
    pub placeholder: PlaceholderStyle,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            list_delimiter: ',',
            or_delimiter: '|',
            ignore_unknown_filters: false,
            placeholder: PlaceholderStyle::Question,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ParserConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("QK_LIST_DELIMITER") {
            config.list_delimiter = single_char("QK_LIST_DELIMITER", &value)?;
        }
        if let Some(value) = lookup("QK_OR_DELIMITER") {
            config.or_delimiter = single_char("QK_OR_DELIMITER", &value)?;
        }
        if let Some(value) = lookup("QK_IGNORE_UNKNOWN_FILTERS") {
            config.ignore_unknown_filters = match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "QK_IGNORE_UNKNOWN_FILTERS".into(),
                        message: format!("expected a boolean, got {:?}", value),
                    })
                }
            };
        }
        if let Some(value) = lookup("QK_PLACEHOLDER") {
            config.placeholder =
                PlaceholderStyle::from_str(&value).ok_or_else(|| ConfigError::InvalidValue {
                    key: "QK_PLACEHOLDER".into(),
                    message: format!("expected question or dollar, got {:?}", value),
                })?;
        }

        config.validate()?;

        tracing::debug!(
            list_delimiter = %config.list_delimiter,
            or_delimiter = %config.or_delimiter,
            ignore_unknown_filters = config.ignore_unknown_filters,
            "Parser configuration loaded"
        );

        Ok(config)
    }

    /// Check that the delimiters can be told apart
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_delimiter == self.or_delimiter {
            return Err(ConfigError::InvalidValue {
                key: "QK_OR_DELIMITER".into(),
                message: "must differ from the list delimiter".into(),
            });
        }
        Ok(())
    }
}

fn single_char(key: &str, value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a single character, got {:?}", value),
        }),
    }
}
