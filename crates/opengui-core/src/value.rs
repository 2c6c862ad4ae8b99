//! Helpers for the JSON-like values carried by fields.
//!
//! Field values are plain `serde_json::Value`s. A JSON `null` is treated as
//! an absent value everywhere in the engine, so these helpers normalise it
//! away at the boundaries and render values for error messages.

use serde_json::Value;

/// Normalise an optional value so that JSON `null` becomes `None`.
pub fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// Truthiness of a value used for the boolean attributes of a spec.
///
/// `false`, `0`, `""`, `[]`, `{}` and `null` are falsy, everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value as a user reads it: strings unquoted, everything else as
/// its JSON literal.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => list(items),
        other => other.to_string(),
    }
}

/// Render a list with single-quoted strings, e.g. `['x', 1, true]`.
pub fn list(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(quoted).collect();
    format!("[{}]", rendered.join(", "))
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        Value::Array(items) => list(items),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_present_drops_null() {
        assert_eq!(present(Some(Value::Null)), None);
        assert_eq!(present(Some(json!(0))), Some(json!(0)));
        assert_eq!(present(None), None);
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!(2)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn test_rendering() {
        assert_eq!(scalar(&json!("abc")), "abc");
        assert_eq!(scalar(&json!(0)), "0");
        assert_eq!(list(&[json!(0)]), "[0]");
        assert_eq!(list(&[json!("x"), json!(true)]), "['x', true]");
    }
}
