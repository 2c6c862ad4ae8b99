//! A dynamic example form.
//!
//! The user picks one or more `types`; each picked type adds its own fields
//! on the next build. `types` and `style` are triggers, so clients rebuild
//! the form whenever either changes.

use serde_json::{json, Map, Value};

use crate::fields::{Fields, FieldsError};
use crate::prompt::Form;
use crate::spec::FieldSpec;

pub const TEXTAREA: &str = "textarea";
pub const OPTIONS: &str = "options";
pub const FIELDS: &str = "fields";

/// The example wizard.
#[derive(Debug, Clone, Copy, Default)]
pub struct Example;

impl Example {
    pub fn new() -> Self {
        Example
    }
}

fn picked(fields: &Fields, kind: &str) -> bool {
    fields
        .get("types")
        .and_then(|types| types.value.as_ref())
        .and_then(Value::as_array)
        .is_some_and(|types| types.iter().any(|item| item.as_str() == Some(kind)))
}

impl Form for Example {
    fn build(&self, values: &Map<String, Value>) -> Result<Fields, FieldsError> {
        let mut fields = Fields::builder()
            .values(values.clone())
            .fields([FieldSpec::new("types")
                .options([TEXTAREA, OPTIONS, FIELDS])
                .multi(true)
                .trigger(true)])
            .build()?;

        if picked(&fields, TEXTAREA) {
            fields.append(FieldSpec::new("people").required(true).content("style", TEXTAREA))?;
            fields.ready = Some(true);
        }

        if picked(&fields, OPTIONS) {
            let style = fields
                .append(
                    FieldSpec::new("style")
                        .options(["radios", "select"])
                        .default_value("radios")
                        .trigger(true),
                )?
                .value
                .clone()
                .unwrap_or_else(|| json!("radios"));

            fields.append(
                FieldSpec::new("stuff")
                    .options(["fee", "fie", "foe", "fum"])
                    .content("style", style),
            )?;
            fields.ready = Some(true);
        }

        if picked(&fields, FIELDS) {
            fields.append(
                FieldSpec::new("things").fields([FieldSpec::new("yin").required(true), FieldSpec::new("yang")]),
            )?;
            fields.ready = Some(true);
        }

        tracing::debug!(fields = fields.len(), ready = ?fields.ready, "Built example form");
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_empty_shows_only_types() {
        let fields = Example.build(&Map::new()).unwrap();
        assert_eq!(fields.names().collect::<Vec<_>>(), ["types"]);
        assert!(fields.ready.is_none());
        assert!(fields["types"].multi);
        assert!(fields["types"].trigger);
    }

    #[test]
    fn test_textarea_adds_people() {
        let fields = Example.build(&values(json!({"types": ["textarea"]}))).unwrap();
        assert_eq!(fields.names().collect::<Vec<_>>(), ["types", "people"]);
        assert!(fields["people"].required);
        assert_eq!(fields["people"].content["style"], json!("textarea"));
        assert_eq!(fields.ready, Some(true));
    }

    #[test]
    fn test_options_style_follows_value() {
        let fields = Example.build(&values(json!({"types": ["options"]}))).unwrap();
        assert_eq!(fields.names().collect::<Vec<_>>(), ["types", "style", "stuff"]);
        assert_eq!(fields["stuff"].content["style"], json!("radios"));

        let fields = Example
            .build(&values(json!({"types": ["options"], "style": "select"})))
            .unwrap();
        assert_eq!(fields["stuff"].content["style"], json!("select"));
    }

    #[test]
    fn test_everything_picked() {
        let mut fields = Example
            .build(&values(json!({
                "types": ["textarea", "options", "fields"],
                "people": "us",
                "stuff": "fum",
                "things": {"yin": "a"}
            })))
            .unwrap();

        assert_eq!(
            fields.names().collect::<Vec<_>>(),
            ["types", "people", "style", "stuff", "things"]
        );
        assert!(fields.validate(true));
        assert_eq!(fields["style"].value, Some(json!("radios")));
        assert_eq!(fields["things"]["yin"].value, Some(json!("a")));
    }

    #[test]
    fn test_bad_values_fail_validation() {
        let mut fields = Example
            .build(&values(json!({"types": ["fields", "nope"], "stuff": "x"})))
            .unwrap();

        assert!(!fields.validate(true));
        assert_eq!(fields.errors, vec!["unknown field 'stuff'"]);
        assert_eq!(fields["types"].errors, vec!["invalid values ['nope']"]);
        assert_eq!(fields["things"]["yin"].errors, vec!["missing value"]);
    }
}
