//! Field specs: the declarative input a collection is built from.
//!
//! A spec arrives either typed, through the [`FieldSpec`] builder, or as a
//! JSON-like mapping. Mappings are split into the fixed attribute set and
//! free-form content: every recognized key is routed to its attribute, every
//! other key lands in `content`.

use serde_json::{Map, Value};

use crate::validation::Validation;
use crate::value;

/// The fixed attribute names of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Name,
    Value,
    Original,
    Default,
    Options,
    Required,
    Multi,
    Trigger,
    Readonly,
    Validation,
    Content,
    Errors,
    Fields,
}

impl Attribute {
    /// Every attribute, in serialization order.
    pub const ALL: [Attribute; 13] = [
        Attribute::Name,
        Attribute::Value,
        Attribute::Original,
        Attribute::Default,
        Attribute::Options,
        Attribute::Required,
        Attribute::Multi,
        Attribute::Trigger,
        Attribute::Readonly,
        Attribute::Validation,
        Attribute::Content,
        Attribute::Errors,
        Attribute::Fields,
    ];

    /// The key this attribute uses in spec mappings and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Value => "value",
            Attribute::Original => "original",
            Attribute::Default => "default",
            Attribute::Options => "options",
            Attribute::Required => "required",
            Attribute::Multi => "multi",
            Attribute::Trigger => "trigger",
            Attribute::Readonly => "readonly",
            Attribute::Validation => "validation",
            Attribute::Content => "content",
            Attribute::Errors => "errors",
            Attribute::Fields => "fields",
        }
    }

    /// Look up an attribute by key.
    pub fn from_key(key: &str) -> Option<Self> {
        Attribute::ALL.iter().copied().find(|a| a.as_str() == key)
    }

    /// Keys of every attribute.
    pub fn keys() -> Vec<&'static str> {
        Attribute::ALL.iter().map(|a| a.as_str()).collect()
    }
}

/// Split a mapping into `(attributes, content)` by the `recognized` keys.
///
/// Order is preserved within each half.
pub fn split(recognized: &[&str], input: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut attributes = Map::new();
    let mut content = Map::new();

    for (key, value) in input {
        if recognized.contains(&key.as_str()) {
            attributes.insert(key, value);
        } else {
            content.insert(key, value);
        }
    }

    (attributes, content)
}

/// A typed field spec.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub name: Option<String>,
    pub value: Option<Value>,
    pub original: Option<Value>,
    pub default: Option<Value>,
    pub options: Option<Vec<Value>>,
    pub required: bool,
    pub multi: bool,
    pub trigger: bool,
    pub readonly: bool,
    pub validation: Option<Validation>,
    pub content: Map<String, Value>,
    pub errors: Vec<String>,
    /// Nested specs; present makes the field a group.
    pub fields: Option<Vec<FieldSpec>>,
}

impl FieldSpec {
    /// Start a spec for the named field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Build a spec from a mapping, routing unrecognized keys into content.
    ///
    /// An explicit `content` mapping is the base; loose keys are added on top.
    /// Attribute names inside `content` set the attribute instead, unless the
    /// mapping also sets it directly.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let (mut attributes, loose) = split(&Attribute::keys(), map);

        let mut spec = <FieldSpec as Default>::default();
        if let Some(content) = attributes.remove(Attribute::Content.as_str()) {
            spec.assign(Attribute::Content, content);
        }
        for (key, value) in attributes {
            if let Some(attribute) = Attribute::from_key(&key) {
                spec.assign(attribute, value);
            }
        }
        spec.content.extend(loose);
        spec
    }

    /// Set one attribute from a raw value, coercing it to the attribute's shape.
    pub fn assign(&mut self, attribute: Attribute, raw: Value) {
        match attribute {
            Attribute::Name => self.name = coerce_name(raw),
            Attribute::Value => self.value = value::present(Some(raw)),
            Attribute::Original => self.original = value::present(Some(raw)),
            Attribute::Default => self.default = value::present(Some(raw)),
            Attribute::Options => self.options = coerce_options(raw),
            Attribute::Required => self.required = value::truthy(&raw),
            Attribute::Multi => self.multi = value::truthy(&raw),
            Attribute::Trigger => self.trigger = value::truthy(&raw),
            Attribute::Readonly => self.readonly = value::truthy(&raw),
            Attribute::Validation => self.validation = coerce_validation(raw),
            Attribute::Content => {
                self.content = Map::new();
                self.absorb(coerce_content(raw));
            }
            Attribute::Errors => self.errors = coerce_errors(raw),
            Attribute::Fields => self.fields = coerce_specs(raw),
        }
    }

    /// Merge content entries, assigning any that name an attribute.
    fn absorb(&mut self, content: Map<String, Value>) {
        let (attributes, loose) = split(&Attribute::keys(), content);
        self.content.extend(loose);
        for (key, raw) in attributes {
            match Attribute::from_key(&key) {
                Some(Attribute::Content) => self.absorb(coerce_content(raw)),
                Some(attribute) => self.assign(attribute, raw),
                None => {}
            }
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value::present(Some(value.into()));
        self
    }

    pub fn original(mut self, original: impl Into<Value>) -> Self {
        self.original = value::present(Some(original.into()));
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = value::present(Some(default.into()));
        self
    }

    pub fn options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn trigger(mut self, trigger: bool) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn validation(mut self, validation: impl Into<Validation>) -> Self {
        self.validation = Some(validation.into());
        self
    }

    /// Add one content entry. An attribute name sets that attribute.
    pub fn content(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut entry = Map::new();
        entry.insert(key.into(), value.into());
        self.absorb(entry);
        self
    }

    pub fn errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.into_iter().map(Into::into).collect();
        self
    }

    /// Render the data part of the spec for error messages, e.g. `{"label":"A"}`.
    pub(crate) fn summary(&self) -> String {
        let mut out = Map::new();
        if let Some(name) = &self.name {
            out.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(value) = &self.value {
            out.insert("value".to_string(), value.clone());
        }
        if let Some(options) = &self.options {
            out.insert("options".to_string(), Value::Array(options.clone()));
        }
        for (key, value) in &self.content {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out).to_string()
    }

    /// Make this spec a group of the given sub-specs.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

impl From<Map<String, Value>> for FieldSpec {
    fn from(map: Map<String, Value>) -> Self {
        FieldSpec::from_map(map)
    }
}

impl From<Value> for FieldSpec {
    /// Non-object values yield a spec without a name.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => FieldSpec::from_map(map),
            other => {
                tracing::warn!(spec = %other, "Field spec is not a mapping");
                <FieldSpec as Default>::default()
            }
        }
    }
}

pub(crate) fn coerce_name(raw: Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(name) => Some(name),
        other => Some(other.to_string()),
    }
}

/// Options must be a list; a lone scalar becomes a single option.
pub(crate) fn coerce_options(raw: Value) -> Option<Vec<Value>> {
    match raw {
        Value::Null => None,
        Value::Array(items) => Some(items),
        other => {
            tracing::warn!(options = %other, "Options is not a list, wrapping it");
            Some(vec![other])
        }
    }
}

/// Only pattern strings can come from data; anything else is dropped.
pub(crate) fn coerce_validation(raw: Value) -> Option<Validation> {
    match raw {
        Value::Null => None,
        Value::String(pattern) => Some(Validation::Pattern(pattern)),
        other => {
            tracing::warn!(validation = %other, "Ignoring non-pattern validation");
            None
        }
    }
}

pub(crate) fn coerce_content(raw: Value) -> Map<String, Value> {
    match raw {
        Value::Object(content) => content,
        Value::Null => Map::new(),
        other => {
            tracing::warn!(content = %other, "Ignoring content that is not a mapping");
            Map::new()
        }
    }
}

pub(crate) fn coerce_errors(raw: Value) -> Vec<String> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(value::scalar).collect(),
        other => vec![value::scalar(&other)],
    }
}

pub(crate) fn coerce_specs(raw: Value) -> Option<Vec<FieldSpec>> {
    match raw {
        Value::Null => None,
        Value::Array(items) => Some(items.into_iter().map(FieldSpec::from).collect()),
        other => {
            tracing::warn!(fields = %other, "Ignoring fields that are not a list");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_split_routes_recognized_keys() {
        let (attributes, content) = split(
            &["name", "value"],
            map(json!({"name": "a", "label": "A", "value": 1, "help": "?"})),
        );
        assert_eq!(Value::Object(attributes), json!({"name": "a", "value": 1}));
        assert_eq!(Value::Object(content), json!({"label": "A", "help": "?"}));
    }

    #[test]
    fn test_attribute_keys_round_trip() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_key(attribute.as_str()), Some(attribute));
        }
        assert_eq!(Attribute::from_key("label"), None);
    }

    #[test]
    fn test_from_map_merges_content() {
        let spec = FieldSpec::from(json!({
            "name": "a",
            "content": {"label": "base", "help": "h"},
            "label": "A",
            "required": true,
            "options": [1, 2],
            "validation": "^a"
        }));
        assert_eq!(spec.name.as_deref(), Some("a"));
        assert!(spec.required);
        assert_eq!(spec.options, Some(vec![json!(1), json!(2)]));
        assert_eq!(spec.validation.unwrap().as_pattern(), Some("^a"));
        assert_eq!(Value::Object(spec.content), json!({"label": "A", "help": "h"}));
    }

    #[test]
    fn test_content_attribute_names_set_attributes() {
        let spec = FieldSpec::from(json!({
            "name": "a",
            "content": {"required": true, "label": "A", "options": ["x"]},
            "options": ["y"]
        }));
        assert!(spec.required);
        assert_eq!(spec.options, Some(vec![json!("y")]));
        assert_eq!(Value::Object(spec.content), json!({"label": "A"}));

        let nested = FieldSpec::from(json!({
            "name": "b",
            "content": {"content": {"multi": true, "help": "h"}}
        }));
        assert!(nested.multi);
        assert_eq!(Value::Object(nested.content), json!({"help": "h"}));

        let built = FieldSpec::new("c")
            .content("required", true)
            .content("name", "d")
            .content("label", "C");
        assert!(built.required);
        assert_eq!(built.name.as_deref(), Some("d"));
        assert_eq!(Value::Object(built.content), json!({"label": "C"}));
    }

    #[test]
    fn test_from_map_nested_specs() {
        let spec = FieldSpec::from(json!({"name": "g", "fields": [{"name": "x"}, {"name": "y"}]}));
        let nested = spec.fields.unwrap();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[1].name.as_deref(), Some("y"));
    }

    #[test]
    fn test_null_is_absent() {
        let spec = FieldSpec::from(json!({"name": "a", "value": null, "options": null}));
        assert!(spec.value.is_none());
        assert!(spec.options.is_none());
    }

    #[test]
    fn test_non_object_has_no_name() {
        assert!(FieldSpec::from(json!("a")).name.is_none());
    }

    #[test]
    fn test_builder() {
        let spec = FieldSpec::new("c")
            .options([1, 2])
            .multi(true)
            .content("label", "C")
            .fields([FieldSpec::new("d")]);
        assert_eq!(spec.options.unwrap().len(), 2);
        assert!(spec.multi);
        assert_eq!(spec.content["label"], json!("C"));
        assert_eq!(spec.fields.unwrap()[0].name.as_deref(), Some("d"));
    }
}
