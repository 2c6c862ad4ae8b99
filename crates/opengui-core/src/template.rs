//! Placeholder substitution for field content.
//!
//! Content strings may reference other values by name:
//! - `{{ name }}` is replaced with the value rendered as a scalar
//! - `{[ name ]}` is replaced with the value as a list; a string that is
//!   nothing but one such placeholder becomes the list itself
//!
//! Names resolve against the sibling fields of a collection first, then its
//! external `values`. Rendering never mutates the tree.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::field::Field;
use crate::fields::Fields;
use crate::value;

lazy_static! {
    /// Either placeholder form: group 1 is a `{{ }}` name, group 2 a `{[ ]}` name.
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}|\{\[\s*([^\[\]\s]+)\s*\]\}").unwrap();

    static ref WHOLE_LIST_PLACEHOLDER: Regex =
        Regex::new(r"^\s*\{\[\s*([^\[\]\s]+)\s*\]\}\s*$").unwrap();
}

/// Resolve a name against `scope`: sibling field value, then external value.
pub fn lookup(scope: &Fields, name: &str) -> Option<Value> {
    scope
        .get(name)
        .and_then(|field| field.value.clone())
        .or_else(|| value::present(scope.values.get(name).cloned()))
}

fn as_list(found: Option<Value>) -> Vec<Value> {
    match found {
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
        None => Vec::new(),
    }
}

/// Substitute every placeholder in `text` in a single pass, so substituted
/// values are never scanned again. Unknown names render empty.
pub fn render(scope: &Fields, text: &str) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match (caps.get(1), caps.get(2)) {
            (Some(name), _) => lookup(scope, name.as_str())
                .map(|found| value::scalar(&found))
                .unwrap_or_default(),
            (None, Some(name)) => as_list(lookup(scope, name.as_str()))
                .iter()
                .map(value::scalar)
                .collect::<Vec<_>>()
                .join(", "),
            (None, None) => String::new(),
        })
        .into_owned()
}

/// Render one content value, recursing into lists and mappings.
pub fn render_value(scope: &Fields, content: &Value) -> Value {
    match content {
        Value::String(text) => match WHOLE_LIST_PLACEHOLDER.captures(text) {
            Some(caps) => Value::Array(as_list(lookup(scope, &caps[1]))),
            None => Value::String(render(scope, text)),
        },
        Value::Array(items) => Value::Array(items.iter().map(|item| render_value(scope, item)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), render_value(scope, item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The field's content with placeholders resolved against `scope`.
pub fn render_content(scope: &Fields, field: &Field) -> Map<String, Value> {
    field
        .content
        .iter()
        .map(|(key, content)| (key.clone(), render_value(scope, content)))
        .collect()
}
