//! Ordered, name-indexed collections of fields.
//!
//! A `Fields` is built from a list of specs plus external value and original
//! maps. Values are injected into specs by name as they are appended; values
//! that never find a field are reported when the collection is validated.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::field::{Field, FieldKind};
use crate::spec::{self, Attribute, FieldSpec};
use crate::validation::CrossCheck;
use crate::value;

/// Names of fields from the root of a tree down to one field.
pub type FieldPath = Vec<String>;

/// Structural errors: malformed specs or misuse of the tree.
///
/// These abort the current operation. Data validation problems are never
/// reported this way; they end up on `errors` lists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldsError {
    #[error("Missing name in {spec}")]
    MissingName { spec: String },

    #[error("Name {name} exists")]
    DuplicateName { name: String },

    #[error("Field {name} has no nested fields")]
    NotAGroup { name: String },

    #[error("No field at {}", .path.join("."))]
    UnknownPath { path: FieldPath },
}

/// Read access to current and original values shared by fields and collections.
pub trait ValueSource {
    fn current_value(&self) -> Option<Value>;
    fn original_value(&self) -> Option<Value>;
}

/// A key that locates a field within a collection.
pub trait FieldKey {
    fn position(&self, fields: &Fields) -> Option<usize>;
}

impl FieldKey for usize {
    fn position(&self, fields: &Fields) -> Option<usize> {
        (*self < fields.len()).then_some(*self)
    }
}

impl FieldKey for &str {
    fn position(&self, fields: &Fields) -> Option<usize> {
        fields.names.get(*self).copied()
    }
}

impl FieldKey for &String {
    fn position(&self, fields: &Fields) -> Option<usize> {
        fields.names.get(self.as_str()).copied()
    }
}

/// An ordered collection of uniquely named fields.
#[derive(Clone, Default)]
pub struct Fields {
    order: Vec<Field>,
    names: HashMap<String, usize>,

    /// External current values, keyed by field name
    pub values: Map<String, Value>,

    /// External prior values, keyed by field name
    pub originals: Map<String, Value>,

    /// Collection-level errors from the last stored validation
    pub errors: Vec<String>,

    /// Result of the last stored validation
    pub valid: Option<bool>,

    /// Cross-field check run after the member fields
    pub validation: Option<CrossCheck>,

    /// Caller-set flag that the form is complete enough to submit
    pub ready: Option<bool>,

    /// A group value that was not a mapping, reported on validation
    pub(crate) stray: Option<Value>,
}

impl Fields {
    /// An empty collection with no values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a collection.
    pub fn builder() -> FieldsBuilder {
        FieldsBuilder::default()
    }

    /// Append a field built from `spec`.
    ///
    /// Missing `value`/`original` are taken from the collection's maps by name.
    pub fn append(&mut self, spec: impl Into<FieldSpec>) -> Result<&mut Field, FieldsError> {
        let mut spec = spec.into();

        let name = match spec.name.clone() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(FieldsError::MissingName { spec: spec.summary() }),
        };

        if self.names.contains_key(&name) {
            return Err(FieldsError::DuplicateName { name });
        }

        if spec.value.is_none() {
            spec.value = value::present(self.values.get(&name).cloned());
        }
        if spec.original.is_none() {
            spec.original = value::present(self.originals.get(&name).cloned());
        }

        let field = Field::from_spec(spec)?;
        tracing::debug!(field = %name, group = field.is_group(), "Appended field");

        let index = self.order.len();
        self.order.push(field);
        self.names.insert(name, index);
        Ok(&mut self.order[index])
    }

    /// Append each spec in order, stopping at the first failure.
    pub fn extend<I, S>(&mut self, specs: I) -> Result<(), FieldsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        for spec in specs {
            self.append(spec)?;
        }
        Ok(())
    }

    /// Insert a new field or overwrite attributes of an existing one.
    ///
    /// For an existing field each attribute key replaces that attribute and
    /// every other key is merged into its content. Position is unchanged.
    pub fn update(&mut self, spec: Map<String, Value>) -> Result<&mut Field, FieldsError> {
        let name = match spec.get("name").cloned().and_then(spec::coerce_name) {
            Some(name) if !name.is_empty() => name,
            _ => return self.append(spec),
        };

        let Some(index) = self.names.get(&name).copied() else {
            return self.append(spec);
        };

        let field = &mut self.order[index];
        let (mut attributes, loose) = spec::split(&Attribute::keys(), spec);
        if let Some(content) = attributes.remove(Attribute::Content.as_str()) {
            field.set_attribute(Attribute::Content, content)?;
        }
        for (key, raw) in attributes {
            if let Some(attribute) = Attribute::from_key(&key) {
                field.set_attribute(attribute, raw)?;
            }
        }
        field.content.extend(loose);
        tracing::debug!(field = %name, "Updated field");
        Ok(field)
    }

    /// Validate every field and the cross-field check.
    ///
    /// Unknown value names are collection errors. Every field is validated,
    /// even after a failure, so all error lists are populated in one pass.
    pub fn validate(&mut self, store: bool) -> bool {
        let mut errors: Vec<String> = self
            .stray
            .iter()
            .map(|stray| format!("invalid value '{}'", value::scalar(stray)))
            .collect();

        errors.extend(
            self.values
                .keys()
                .filter(|key| !self.names.contains_key(key.as_str()))
                .map(|key| format!("unknown field '{}'", key)),
        );

        let mut valid = errors.is_empty();

        for field in &mut self.order {
            valid = field.validate(store) && valid;
        }

        if let Some(check) = self.validation.clone() {
            valid = check(self, &mut errors) && valid;
        }

        tracing::debug!(fields = self.order.len(), valid, "Validated fields");

        if store {
            self.valid = Some(valid);
            self.errors = errors;
        }

        valid
    }

    /// Look up a field by position or name.
    pub fn get<K: FieldKey>(&self, key: K) -> Option<&Field> {
        key.position(self).map(|index| &self.order[index])
    }

    /// Mutable lookup by position or name.
    pub fn get_mut<K: FieldKey>(&mut self, key: K) -> Option<&mut Field> {
        key.position(self).map(|index| &mut self.order[index])
    }

    /// Whether a field with this name is in the collection (not nested ones).
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of fields directly in this collection.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection has no fields.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.order.iter()
    }

    /// Iterate fields mutably in insertion order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Field> {
        self.order.iter_mut()
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|field| field.name.as_str())
    }

    /// Follow a path of names down through groups.
    pub fn field_at_path(&self, path: &[String]) -> Option<&Field> {
        let (first, rest) = path.split_first()?;
        let field = self.get(first)?;
        if rest.is_empty() {
            Some(field)
        } else {
            field.fields()?.field_at_path(rest)
        }
    }

    /// Mutable form of [`Fields::field_at_path`].
    pub fn field_at_path_mut(&mut self, path: &[String]) -> Option<&mut Field> {
        let (first, rest) = path.split_first()?;
        let field = self.get_mut(first)?;
        if rest.is_empty() {
            Some(field)
        } else {
            field.fields_mut()?.field_at_path_mut(rest)
        }
    }

    /// Path of the first leaf, depth-first, still waiting for an answer.
    ///
    /// A leaf waits when its value is absent, it is not readonly and its path
    /// is not in `skip`.
    pub fn next_unanswered(&self, skip: &HashSet<FieldPath>) -> Option<FieldPath> {
        let mut path = Vec::new();
        self.next_unanswered_under(&mut path, skip)
    }

    fn next_unanswered_under(&self, path: &mut FieldPath, skip: &HashSet<FieldPath>) -> Option<FieldPath> {
        for field in &self.order {
            path.push(field.name.clone());
            let found = match &field.kind {
                FieldKind::Group(nested) => nested.next_unanswered_under(path, skip),
                FieldKind::Leaf => (field.value.is_none() && !field.readonly && !skip.contains(path))
                    .then(|| path.clone()),
            };
            path.pop();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Flatten every leaf into `{name: value}`; absent values become `null`.
    pub fn leaf_values(&self) -> Map<String, Value> {
        let mut out = Map::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Map<String, Value>) {
        for field in &self.order {
            match &field.kind {
                FieldKind::Group(nested) => nested.collect_leaves(out),
                FieldKind::Leaf => {
                    out.insert(field.name.clone(), field.value.clone().unwrap_or(Value::Null));
                }
            }
        }
    }

    /// Each field's mapping, in order.
    pub fn to_list(&self) -> Vec<Value> {
        self.order.iter().map(Field::to_dict).collect()
    }

    /// `{"fields": [...]}` plus `errors`, `valid` and `ready` when set.
    pub fn to_dict(&self) -> Value {
        let mut out = Map::new();
        out.insert("fields".to_string(), Value::Array(self.to_list()));
        out.insert(
            "errors".to_string(),
            Value::Array(self.errors.iter().cloned().map(Value::String).collect()),
        );
        if let Some(valid) = self.valid {
            out.insert("valid".to_string(), Value::Bool(valid));
        }
        if let Some(ready) = self.ready {
            out.insert("ready".to_string(), Value::Bool(ready));
        }
        Value::Object(out)
    }
}

impl ValueSource for Fields {
    fn current_value(&self) -> Option<Value> {
        Some(Value::Object(self.values.clone()))
    }

    fn original_value(&self) -> Option<Value> {
        Some(Value::Object(self.originals.clone()))
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fields")
            .field("order", &self.order)
            .field("values", &self.values)
            .field("originals", &self.originals)
            .field("errors", &self.errors)
            .field("valid", &self.valid)
            .field("validation", &self.validation.as_ref().map(|_| ".."))
            .field("ready", &self.ready)
            .field("stray", &self.stray)
            .finish()
    }
}

impl Index<usize> for Fields {
    type Output = Field;

    fn index(&self, index: usize) -> &Field {
        &self.order[index]
    }
}

impl<'a> Index<&'a str> for Fields {
    type Output = Field;

    fn index(&self, name: &'a str) -> &Field {
        match self.get(name) {
            Some(field) => field,
            None => panic!("unknown field '{}'", name),
        }
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

/// Builder for a collection with any of its optional parts.
#[derive(Default)]
pub struct FieldsBuilder {
    values: Map<String, Value>,
    originals: Map<String, Value>,
    fields: Vec<FieldSpec>,
    errors: Vec<String>,
    valid: Option<bool>,
    validation: Option<CrossCheck>,
    ready: Option<bool>,
}

impl FieldsBuilder {
    pub fn values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    pub fn originals(mut self, originals: Map<String, Value>) -> Self {
        self.originals = originals;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
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

    pub fn valid(mut self, valid: bool) -> Self {
        self.valid = Some(valid);
        self
    }

    /// Set the cross-field check.
    pub fn validation<F>(mut self, check: F) -> Self
    where
        F: Fn(&Fields, &mut Vec<String>) -> bool + Send + Sync + 'static,
    {
        self.validation = Some(Arc::new(check));
        self
    }

    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = Some(ready);
        self
    }

    /// Build the collection, appending every spec in order.
    pub fn build(self) -> Result<Fields, FieldsError> {
        let mut fields = Fields {
            order: Vec::new(),
            names: HashMap::new(),
            values: self.values,
            originals: self.originals,
            errors: self.errors,
            valid: self.valid,
            validation: self.validation,
            ready: self.ready,
            stray: None,
        };
        fields.extend(self.fields)?;
        Ok(fields)
    }
}
