//! Validation Registry
//!
//! Maps registry keys to validators. A registry key is
//! `<field>[:<type>][:required]`, e.g. `age:int`, `email:required` or
//! `id:int:required`. Fields without an entry cannot be filtered on.
//!
//! ```
//! use qk_queries::validations::{self, Validations};
//!
//! let rules = Validations::new()
//!     .allow("name")
//!     .rule("age:int", validations::min_max(0, 150))
//!     .rule("status", validations::one_of(["active", "banned"]))
//!     .allow("email:required");
//!
//! assert!(rules.lookup("age").is_some());
//! assert!(rules.lookup("email").is_none()); // until the required check passes
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use qk_core::{QueryError, QueryResult, RuleError};

use crate::key::parse_key;
use crate::params::QueryParams;
use crate::value::{Value, ValueKind};

/// Marker suffix for fields that must appear in every request
pub const REQUIRED: &str = "required";

/// Validator predicate run against one converted value
pub type ValidationFn = Arc<dyn Fn(&Value) -> Result<(), RuleError> + Send + Sync>;

/// A parsed registry key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleKey {
    pub field: String,
    pub kind: ValueKind,
    pub required: bool,
}

impl RuleKey {
    /// Parse a registry key such as `age:int:required`
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(':');
        let field = parts.next().unwrap_or_default().to_string();
        let mut kind = ValueKind::default();
        let mut required = false;

        for part in parts {
            if part.eq_ignore_ascii_case(REQUIRED) {
                required = true;
            } else if let Some(hint) = ValueKind::from_hint(part) {
                kind = hint;
            } else {
                tracing::warn!(key = %raw, hint = %part, "Unknown type hint, treating field as string");
            }
        }

        Self {
            field,
            kind,
            required,
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        if self.kind != ValueKind::String {
            write!(f, ":{}", self.kind.as_str())?;
        }
        if self.required {
            write!(f, ":{}", REQUIRED)?;
        }
        Ok(())
    }
}

/// One registry entry
#[derive(Clone)]
pub struct Rule {
    pub key: RuleKey,
    pub validator: Option<ValidationFn>,
}

impl Rule {
    /// Run the validator, if any, against a value
    pub fn check(&self, value: &Value) -> QueryResult<()> {
        match &self.validator {
            Some(validate) => {
                validate(value).map_err(|source| QueryError::validation(&self.key.field, source))
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("key", &self.key)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Registry of allowed fields and their validators
///
/// Holds at most one rule per field; registering a field again replaces its
/// earlier rule.
#[derive(Debug, Clone, Default)]
pub struct Validations {
    rules: BTreeMap<String, Rule>,
}

impl Validations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a field without validating its values
    pub fn allow(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    /// Allow a field and validate its values
    pub fn rule(mut self, key: impl Into<String>, validator: ValidationFn) -> Self {
        self.insert(key, Some(validator));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, validator: Option<ValidationFn>) {
        let key = RuleKey::parse(&key.into());
        if let Some(previous) = self.rules.get(&key.field) {
            tracing::debug!(
                field = %key.field,
                replaced = %previous.key,
                "Rule registered twice, keeping the later one"
            );
        }
        self.rules.insert(key.field.clone(), Rule { key, validator });
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registry keys, e.g. `age:int:required`
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.rules.values().map(|rule| rule.key.to_string())
    }

    /// Rule for a field, ignoring entries still marked required
    pub fn lookup(&self, field: &str) -> Option<&Rule> {
        self.rules.get(field).filter(|rule| !rule.key.required)
    }

    /// Check required fields against the request and return the resolved view
    ///
    /// Every required entry must match the field of at least one request key,
    /// under any method. On success the returned registry holds those entries
    /// without their marker; `self` is left untouched.
    pub fn resolve_required(&self, params: &QueryParams) -> QueryResult<Validations> {
        let mut present = Vec::with_capacity(params.len());
        for key in params.keys() {
            present.push(parse_key(key)?.0);
        }

        let mut resolved = self.clone();
        for rule in resolved.rules.values_mut().filter(|rule| rule.key.required) {
            if !present.contains(&rule.key.field) {
                return Err(QueryError::required(rule.key.field.clone()));
            }
            rule.key.required = false;
        }

        Ok(resolved)
    }
}

/// Wrap a closure as validator
pub fn custom<F>(f: F) -> ValidationFn
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
{
    Arc::new(move |value| f(value).map_err(RuleError::Message))
}

/// Value must be one of the given values
pub fn one_of<T, I>(allowed: I) -> ValidationFn
where
    T: Into<Value>,
    I: IntoIterator<Item = T>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    Arc::new(move |value| {
        if allowed.contains(value) {
            Ok(())
        } else {
            Err(RuleError::NotInScope)
        }
    })
}

/// Integer value must be at least `min`
pub fn min(min: i64) -> ValidationFn {
    Arc::new(move |value| match value.as_int() {
        Some(i) if i >= min => Ok(()),
        Some(_) => Err(RuleError::BelowMin { min }),
        None => Err(RuleError::WrongType),
    })
}

/// Integer value must be at most `max`
pub fn max(max: i64) -> ValidationFn {
    Arc::new(move |value| match value.as_int() {
        Some(i) if i <= max => Ok(()),
        Some(_) => Err(RuleError::AboveMax { max }),
        None => Err(RuleError::WrongType),
    })
}

/// Integer value must lie within `min..=max`
pub fn min_max(min_value: i64, max_value: i64) -> ValidationFn {
    all([min(min_value), max(max_value)])
}

/// String value must not be empty or whitespace
pub fn not_empty() -> ValidationFn {
    Arc::new(|value| match value.as_text() {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(RuleError::Empty),
        None => Err(RuleError::WrongType),
    })
}

/// String value must not exceed `max` characters
pub fn max_length(max: usize) -> ValidationFn {
    Arc::new(move |value| match value.as_text() {
        Some(s) if s.chars().count() <= max => Ok(()),
        Some(_) => Err(RuleError::TooLong { max }),
        None => Err(RuleError::WrongType),
    })
}

/// Run validators in order, stopping at the first rejection
pub fn all(validators: impl IntoIterator<Item = ValidationFn>) -> ValidationFn {
    let validators: Vec<ValidationFn> = validators.into_iter().collect();
    Arc::new(move |value| {
        for validate in &validators {
            validate(value)?;
        }
        Ok(())
    })
}
