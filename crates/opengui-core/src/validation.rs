//! Validation hooks attached to fields and collections.
//!
//! A field carries at most one extra check on top of its built-in rules:
//! either a regular expression its value must match from the start, or a
//! predicate that inspects the field and may record messages. Collections
//! carry an optional cross-field check that runs after every member field.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::field::Field;
use crate::fields::Fields;
use crate::value;

/// Predicate run against a single field. Messages pushed onto the list become
/// the field's errors; returning `false` marks the field invalid.
pub type Predicate = Arc<dyn Fn(&Field, &mut Vec<String>) -> bool + Send + Sync>;

/// Cross-field check run against a whole collection after its fields.
pub type CrossCheck = Arc<dyn Fn(&Fields, &mut Vec<String>) -> bool + Send + Sync>;

/// Extra validation for a field.
#[derive(Clone)]
pub enum Validation {
    /// Regular expression matched from the start of the (string) value.
    Pattern(String),
    /// Arbitrary check with access to the field.
    Predicate(Predicate),
}

impl Validation {
    /// Create a pattern validation.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Validation::Pattern(pattern.into())
    }

    /// Create a predicate validation from a closure.
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&Field, &mut Vec<String>) -> bool + Send + Sync + 'static,
    {
        Validation::Predicate(Arc::new(check))
    }

    /// The pattern string, if this is a pattern validation.
    pub fn as_pattern(&self) -> Option<&str> {
        match self {
            Validation::Pattern(pattern) => Some(pattern),
            Validation::Predicate(_) => None,
        }
    }

    /// Run this validation against a field with a present value.
    pub(crate) fn check(&self, field: &Field, value: &Value, errors: &mut Vec<String>) {
        match self {
            Validation::Pattern(pattern) => match match_start(pattern, &value::scalar(value)) {
                Ok(true) => {}
                Ok(false) => errors.push(format!("must match '{}'", pattern)),
                Err(e) => {
                    tracing::warn!(field = %field.name, pattern = %pattern, error = %e, "Uncompilable validation pattern");
                    errors.push(format!("invalid pattern '{}'", pattern));
                }
            },
            Validation::Predicate(check) => {
                let before = errors.len();
                if !check(field, errors) && errors.len() == before {
                    errors.push("failed validation".to_string());
                }
            }
        }
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Validation::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Validation {
    fn from(pattern: &str) -> Self {
        Validation::pattern(pattern)
    }
}

impl From<String> for Validation {
    fn from(pattern: String) -> Self {
        Validation::Pattern(pattern)
    }
}

/// Match `pattern` against the start of `text`.
fn match_start(pattern: &str, text: &str) -> Result<bool, regex::Error> {
    let anchored = Regex::new(&format!("^(?:{})", pattern))?;
    Ok(anchored.is_match(text))
}
