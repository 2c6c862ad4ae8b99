//! Form document parsing from YAML/JSON.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::validate_document_schema;
use crate::fields::{Fields, FieldsError};
use crate::prompt::Form;
use crate::spec::FieldSpec;

/// Errors that can occur when loading form documents.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Failed to read spec file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Spec document failed schema validation: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error(transparent)]
    Fields(#[from] FieldsError),
}

/// A form described as data: specs plus optional starting values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormDocument {
    /// Spec mappings, in order
    pub fields: Vec<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub values: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub originals: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
}

impl FormDocument {
    /// Parse a document from an already-decoded value.
    ///
    /// A bare list is taken as the `fields` of an otherwise empty document.
    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        let value = match value {
            Value::Array(specs) => {
                let mut wrapped = Map::new();
                wrapped.insert("fields".to_string(), Value::Array(specs));
                Value::Object(wrapped)
            }
            other => other,
        };

        validate_document_schema(&value).map_err(SpecError::SchemaError)?;

        let document: FormDocument = serde_json::from_value(value)?;
        document.validate()?;
        Ok(document)
    }

    /// Parse a document from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a document from JSON string.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a document from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a document from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a document file, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    /// Ensure names are unique within each collection of the document.
    fn validate(&self) -> Result<(), SpecError> {
        validate_unique_names(&self.fields)
    }

    /// Typed specs for every top-level field.
    pub fn specs(&self) -> Vec<FieldSpec> {
        self.fields.iter().cloned().map(FieldSpec::from_map).collect()
    }

    /// Build the tree. `values` and `originals` override the document's own
    /// by name.
    pub fn fields(
        &self,
        values: &Map<String, Value>,
        originals: &Map<String, Value>,
    ) -> Result<Fields, FieldsError> {
        let mut builder = Fields::builder()
            .values(merged(&self.values, values))
            .originals(merged(&self.originals, originals))
            .fields(self.specs());
        if let Some(ready) = self.ready {
            builder = builder.ready(ready);
        }
        builder.build()
    }
}

impl Form for FormDocument {
    fn build(&self, values: &Map<String, Value>) -> Result<Fields, FieldsError> {
        self.fields(values, &Map::new())
    }
}

fn merged(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    out.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
    out
}

fn validate_unique_names(specs: &[Map<String, Value>]) -> Result<(), SpecError> {
    let mut seen = HashSet::new();

    for spec in specs {
        if let Some(name) = spec.get("name").and_then(Value::as_str) {
            if !seen.insert(name) {
                return Err(FieldsError::DuplicateName {
                    name: name.to_string(),
                }
                .into());
            }
        }

        if let Some(Value::Array(nested)) = spec.get("fields") {
            let nested: Vec<Map<String, Value>> = nested
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect();
            validate_unique_names(&nested)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOCUMENT: &str = r#"
fields:
  - name: name
    label: Your name
    required: true
  - name: color
    options: [red, blue]
    default: red
  - name: address
    fields:
      - name: street
      - name: city
        required: true
values:
  name: Ada
"#;

    #[test]
    fn test_parse_yaml_document() {
        let document = FormDocument::from_yaml(DOCUMENT).unwrap();
        assert_eq!(document.fields.len(), 3);
        assert_eq!(document.values["name"], json!("Ada"));

        let specs = document.specs();
        assert_eq!(specs[0].content["label"], json!("Your name"));
        assert!(specs[0].required);
        assert_eq!(specs[2].fields.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_bare_list_document() {
        let document = FormDocument::from_json(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(document.fields.len(), 2);
        assert!(document.values.is_empty());
    }

    #[test]
    fn test_schema_violation() {
        let result = FormDocument::from_json(r#"[{"label": "nameless"}]"#);
        assert!(matches!(result, Err(SpecError::SchemaError(_))));
    }

    #[test]
    fn test_duplicate_names() {
        let result = FormDocument::from_json(r#"[{"name": "a"}, {"name": "a"}]"#);
        assert!(matches!(
            result,
            Err(SpecError::Fields(FieldsError::DuplicateName { .. }))
        ));

        let nested = FormDocument::from_json(
            r#"[{"name": "g", "fields": [{"name": "x"}, {"name": "x"}]}, {"name": "x"}]"#,
        );
        assert!(nested.is_err());

        let separate = FormDocument::from_json(r#"[{"name": "g", "fields": [{"name": "x"}]}, {"name": "x"}]"#);
        assert!(separate.is_ok());
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            FormDocument::from_yaml("fields: [unclosed"),
            Err(SpecError::YamlError(_))
        ));
    }

    #[test]
    fn test_build_merges_values() {
        let document = FormDocument::from_yaml(DOCUMENT).unwrap();

        let mut values = Map::new();
        values.insert("address".to_string(), json!({"city": "Paris"}));
        let mut fields = document.build(&values).unwrap();

        assert_eq!(fields["name"].value, Some(json!("Ada")));
        assert_eq!(fields["address"]["city"].value, Some(json!("Paris")));
        assert!(fields.validate(true));
        assert_eq!(fields["color"].value, Some(json!("red")));
    }

    #[test]
    fn test_originals_override() {
        let document = FormDocument::from_json(
            r#"{"fields": [{"name": "a", "readonly": true}], "originals": {"a": 1}}"#,
        )
        .unwrap();

        let fields = document.fields(&Map::new(), &Map::new()).unwrap();
        assert_eq!(fields["a"].original, Some(json!(1)));

        let mut originals = Map::new();
        originals.insert("a".to_string(), json!(2));
        let mut fields = document.fields(&Map::new(), &originals).unwrap();
        assert!(fields.validate(true));
        assert_eq!(fields["a"].value, Some(json!(2)));
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(matches!(
            FormDocument::from_path("/definitely/not/here.yaml"),
            Err(SpecError::IoError(_))
        ));
    }
}
