//! JSON Schema validation for form documents.
//!
//! Documents are validated against schema/fields.schema.json, embedded at
//! compile time. A bare list of specs is wrapped as `{"fields": [...]}`
//! before it is checked.

use std::sync::OnceLock;

use serde_json::Value;

const FIELDS_SCHEMA_JSON: &str = include_str!("../../schema/fields.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn validator() -> Result<&'static jsonschema::Validator, String> {
    COMPILED_SCHEMA
        .get_or_init(|| {
            let schema: Value =
                serde_json::from_str(FIELDS_SCHEMA_JSON).map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a document against the schema.
///
/// Returns every violation as `"{error} at {instance_path}"`.
pub fn validate_document_schema(document: &Value) -> Result<(), Vec<String>> {
    let errors: Vec<String> = validator()
        .map_err(|e| vec![e])?
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
