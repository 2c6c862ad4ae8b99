//! A single named field, either a leaf input or a group of nested fields.

use std::ops::Index;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::fields::{FieldKey, Fields, FieldsError, ValueSource};
use crate::spec::{self, Attribute, FieldSpec};
use crate::validation::Validation;
use crate::value;

/// Whether a field holds its own value or delegates to a nested collection.
#[derive(Debug, Clone, Default)]
pub enum FieldKind {
    #[default]
    Leaf,
    Group(Fields),
}

/// One form input.
#[derive(Debug, Clone)]
pub struct Field {
    /// Unique key within the owning collection
    pub name: String,

    /// Current value; `None` when absent
    pub value: Option<Value>,

    /// Prior value, used as the readonly fallback
    pub original: Option<Value>,

    /// Fallback when no value is present
    pub default: Option<Value>,

    /// Allowed discrete values
    pub options: Option<Vec<Value>>,

    pub required: bool,
    pub multi: bool,

    /// Hint that changing this value should rebuild the tree
    pub trigger: bool,

    pub readonly: bool,

    /// Extra validation beyond the built-in rules
    pub validation: Option<Validation>,

    /// Free-form metadata (labels, descriptions, UI hints)
    pub content: Map<String, Value>,

    /// Messages from the last stored validation
    pub errors: Vec<String>,

    pub kind: FieldKind,
}

impl Field {
    /// Create a bare leaf field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            original: None,
            default: None,
            options: None,
            required: false,
            multi: false,
            trigger: false,
            readonly: false,
            validation: None,
            content: Map::new(),
            errors: Vec::new(),
            kind: FieldKind::Leaf,
        }
    }

    /// Build a field from a spec.
    ///
    /// A spec with nested `fields` becomes a group whose collection reads its
    /// values and originals from this field's own value and original.
    pub fn from_spec(spec: FieldSpec) -> Result<Self, FieldsError> {
        let name = match spec.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(FieldsError::MissingName {
                    spec: spec.summary(),
                })
            }
        };

        let mut field = Field::new(name);
        field.value = spec.value;
        field.original = spec.original;
        field.default = spec.default;
        field.options = spec.options;
        field.required = spec.required;
        field.multi = spec.multi;
        field.trigger = spec.trigger;
        field.readonly = spec.readonly;
        field.validation = spec.validation;
        field.errors = spec.errors;
        field.absorb_content(spec.content)?;

        if let Some(specs) = spec.fields {
            field.kind = FieldKind::Group(field.nested(specs)?);
        }

        Ok(field)
    }

    fn nested(&self, specs: Vec<FieldSpec>) -> Result<Fields, FieldsError> {
        if matches!(&self.original, Some(original) if !original.is_object()) {
            tracing::warn!(field = %self.name, "Ignoring original of group that is not a mapping");
        }

        let mut fields = Fields::builder()
            .values(as_map(self.value.as_ref()))
            .originals(as_map(self.original.as_ref()))
            .fields(specs)
            .build()?;
        fields.stray = self.value.clone().filter(|value| !value.is_object());
        Ok(fields)
    }

    /// The nested collection, if this is a group.
    pub fn fields(&self) -> Option<&Fields> {
        match &self.kind {
            FieldKind::Group(fields) => Some(fields),
            FieldKind::Leaf => None,
        }
    }

    pub fn fields_mut(&mut self) -> Option<&mut Fields> {
        match &mut self.kind {
            FieldKind::Group(fields) => Some(fields),
            FieldKind::Leaf => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group(_))
    }

    /// Append a spec to the nested collection.
    pub fn append(&mut self, spec: impl Into<FieldSpec>) -> Result<&mut Field, FieldsError> {
        let name = self.name.clone();
        self.fields_mut()
            .ok_or(FieldsError::NotAGroup { name })?
            .append(spec)
    }

    /// Append each spec to the nested collection in order.
    pub fn extend<I, S>(&mut self, specs: I) -> Result<(), FieldsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        let name = self.name.clone();
        self.fields_mut()
            .ok_or(FieldsError::NotAGroup { name })?
            .extend(specs)
    }

    /// Look up a nested field by position or name. Always `None` on a leaf.
    pub fn get<K: FieldKey>(&self, key: K) -> Option<&Field> {
        self.fields().and_then(|fields| fields.get(key))
    }

    pub fn get_mut<K: FieldKey>(&mut self, key: K) -> Option<&mut Field> {
        self.fields_mut().and_then(|fields| fields.get_mut(key))
    }

    /// Whether the nested collection has a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields().is_some_and(|fields| fields.contains(name))
    }

    /// Number of nested fields; `None` on a leaf.
    pub fn len(&self) -> Option<usize> {
        self.fields().map(Fields::len)
    }

    /// Iterate nested fields. A leaf yields nothing.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        match &self.kind {
            FieldKind::Group(fields) => fields.iter(),
            FieldKind::Leaf => {
                let empty: &[Field] = &[];
                empty.iter()
            }
        }
    }

    /// Overwrite one attribute in place from a raw value.
    ///
    /// The name is immutable; a `fields` list rebuilds the nested collection.
    pub fn set_attribute(&mut self, attribute: Attribute, raw: Value) -> Result<(), FieldsError> {
        match attribute {
            Attribute::Name => {
                if spec::coerce_name(raw).as_deref() != Some(self.name.as_str()) {
                    tracing::warn!(field = %self.name, "Ignoring attempt to rename field");
                }
            }
            Attribute::Value => self.value = value::present(Some(raw)),
            Attribute::Original => self.original = value::present(Some(raw)),
            Attribute::Default => self.default = value::present(Some(raw)),
            Attribute::Options => self.options = spec::coerce_options(raw),
            Attribute::Required => self.required = value::truthy(&raw),
            Attribute::Multi => self.multi = value::truthy(&raw),
            Attribute::Trigger => self.trigger = value::truthy(&raw),
            Attribute::Readonly => self.readonly = value::truthy(&raw),
            Attribute::Validation => self.validation = spec::coerce_validation(raw),
            Attribute::Content => {
                self.content = Map::new();
                self.absorb_content(spec::coerce_content(raw))?;
            }
            Attribute::Errors => self.errors = spec::coerce_errors(raw),
            Attribute::Fields => {
                self.kind = match spec::coerce_specs(raw) {
                    Some(specs) => FieldKind::Group(self.nested(specs)?),
                    None => FieldKind::Leaf,
                };
            }
        }
        Ok(())
    }

    /// Merge content entries, setting any that name an attribute.
    pub(crate) fn absorb_content(&mut self, content: Map<String, Value>) -> Result<(), FieldsError> {
        let (attributes, loose) = spec::split(&Attribute::keys(), content);
        self.content.extend(loose);
        for (key, raw) in attributes {
            match Attribute::from_key(&key) {
                Some(Attribute::Content) => self.absorb_content(spec::coerce_content(raw))?,
                Some(attribute) => self.set_attribute(attribute, raw)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Validate this field, storing the errors when `store` is set.
    ///
    /// A group delegates entirely to its nested collection. A leaf first
    /// resolves its value (default, then original when readonly) and then
    /// applies the required, multi and options rules, followed by any extra
    /// validation.
    pub fn validate(&mut self, store: bool) -> bool {
        if let FieldKind::Group(fields) = &mut self.kind {
            return fields.validate(store);
        }

        let mut errors = Vec::new();

        if self.value.is_none() {
            if self.default.is_some() {
                self.value = self.default.clone();
            } else if self.readonly {
                self.value = self.original.clone();
            }
        }

        match &self.value {
            None => {
                if self.required && !self.readonly {
                    errors.push("missing value".to_string());
                }
            }
            Some(current) if self.multi => match current.as_array() {
                None => errors.push("multi requires list".to_string()),
                Some(items) => {
                    if let Some(options) = &self.options {
                        let invalid: Vec<Value> = items
                            .iter()
                            .filter(|item| !options.contains(item))
                            .cloned()
                            .collect();
                        if !invalid.is_empty() {
                            errors.push(format!("invalid values {}", value::list(&invalid)));
                        }
                    }
                }
            },
            Some(current) => {
                if let Some(options) = &self.options {
                    if !options.contains(current) {
                        errors.push(format!("invalid value '{}'", value::scalar(current)));
                    }
                }
            }
        }

        if let (Some(validation), Some(current)) = (self.validation.clone(), self.value.clone()) {
            validation.check(self, &current, &mut errors);
        }

        let valid = errors.is_empty();
        tracing::debug!(field = %self.name, valid, "Validated field");

        if store {
            self.errors = errors;
        }

        valid
    }

    /// Serialize to a plain mapping.
    ///
    /// Flags appear only when set, function validations are omitted, and
    /// content entries are merged at the top level.
    pub fn to_dict(&self) -> Value {
        let mut out = Map::new();
        out.insert("name".to_string(), Value::String(self.name.clone()));

        if let Some(value) = &self.value {
            out.insert("value".to_string(), value.clone());
        }
        if let Some(original) = &self.original {
            out.insert("original".to_string(), original.clone());
        }
        if let Some(default) = &self.default {
            out.insert("default".to_string(), default.clone());
        }
        if let Some(options) = &self.options {
            out.insert("options".to_string(), Value::Array(options.clone()));
        }

        for (key, flag) in [
            ("required", self.required),
            ("multi", self.multi),
            ("trigger", self.trigger),
            ("readonly", self.readonly),
        ] {
            if flag {
                out.insert(key.to_string(), Value::Bool(true));
            }
        }

        if let Some(pattern) = self.validation.as_ref().and_then(Validation::as_pattern) {
            out.insert("validation".to_string(), Value::String(pattern.to_string()));
        }

        for (key, value) in &self.content {
            out.insert(key.clone(), value.clone());
        }

        if !self.errors.is_empty() {
            out.insert(
                "errors".to_string(),
                Value::Array(self.errors.iter().cloned().map(Value::String).collect()),
            );
        }

        if let FieldKind::Group(fields) = &self.kind {
            out.insert("fields".to_string(), Value::Array(fields.to_list()));
        }

        Value::Object(out)
    }
}

impl ValueSource for Field {
    fn current_value(&self) -> Option<Value> {
        self.value.clone()
    }

    fn original_value(&self) -> Option<Value> {
        self.original.clone()
    }
}

impl Index<usize> for Field {
    type Output = Field;

    fn index(&self, index: usize) -> &Field {
        match self.fields() {
            Some(fields) => &fields[index],
            None => panic!("field '{}' is not a group", self.name),
        }
    }
}

impl<'a> Index<&'a str> for Field {
    type Output = Field;

    fn index(&self, name: &'a str) -> &Field {
        match self.fields() {
            Some(fields) => &fields[name],
            None => panic!("field '{}' is not a group", self.name),
        }
    }
}

impl<'a> IntoIterator for &'a Field {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

fn as_map(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}
