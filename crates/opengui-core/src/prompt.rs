//! Question-by-question driving of a form.
//!
//! A [`Session`] owns the values collected so far and the tree built from
//! them by a [`Form`]. Callers ask it for the next unanswered field, render
//! the [`Prompt`] it describes, parse the user's text into an [`Answer`] and
//! feed it back. Answering a trigger field rebuilds the tree so dependent
//! fields can appear or disappear.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::field::Field;
use crate::fields::{FieldPath, Fields, FieldsError};
use crate::template;

/// Something that builds a field tree from the values known so far.
pub trait Form {
    fn build(&self, values: &Map<String, Value>) -> Result<Fields, FieldsError>;
}

impl<F> Form for F
where
    F: Fn(&Map<String, Value>) -> Result<Fields, FieldsError>,
{
    fn build(&self, values: &Map<String, Value>) -> Result<Fields, FieldsError> {
        self(values)
    }
}

/// A parsed reply to a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// A value to set directly; `None` leaves the field empty
    Value(Option<Value>),
    /// 1-based indexes into the field's options
    Choice(Vec<usize>),
}

impl Answer {
    /// Parse raw text for `field`.
    ///
    /// Empty text is no answer. When the field has options and every token is
    /// a number the tokens are choices. Multi fields split on commas.
    pub fn parse(field: &Field, raw: &str) -> Answer {
        let raw = raw.trim();
        if raw.is_empty() {
            return Answer::Value(None);
        }

        if field.options.is_some() {
            let tokens: Vec<&str> = raw
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .collect();
            let choices: Option<Vec<usize>> = tokens.iter().map(|token| token.parse().ok()).collect();
            if let Some(choices) = choices {
                return Answer::Choice(choices);
            }
        }

        if field.multi {
            let items = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_scalar)
                .collect();
            return Answer::Value(Some(Value::Array(items)));
        }

        Answer::Value(Some(parse_scalar(raw)))
    }
}

/// A JSON literal if the text is one, otherwise the text as a string.
fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Result of applying an answer to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answered {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Field {
    /// Set this field from an answer and validate just this field.
    pub fn answer(&mut self, answer: Answer) -> Answered {
        let mut choice_errors = Vec::new();

        self.value = match answer {
            Answer::Value(value) => value,
            Answer::Choice(indexes) => {
                let options = self.options.clone().unwrap_or_default();
                let mut picked = Vec::new();
                for index in indexes {
                    match index.checked_sub(1).and_then(|i| options.get(i)) {
                        Some(option) => picked.push(option.clone()),
                        None => choice_errors.push(format!("invalid choice {}", index)),
                    }
                }
                if self.multi {
                    Some(Value::Array(picked))
                } else if picked.len() > 1 {
                    choice_errors.push("multiple choices not allowed".to_string());
                    None
                } else {
                    picked.pop()
                }
            }
        };

        let valid = self.validate(true) && choice_errors.is_empty();
        if !choice_errors.is_empty() {
            choice_errors.append(&mut self.errors);
            self.errors = choice_errors;
        }

        Answered {
            valid,
            errors: self.errors.clone(),
        }
    }
}

/// Everything a driver needs to ask about one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub path: FieldPath,
    pub name: String,
    /// Content with placeholders resolved
    pub content: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub multi: bool,
    pub required: bool,
    pub errors: Vec<String>,
}

impl Prompt {
    /// The `label` content entry, falling back to the field name.
    pub fn label(&self) -> String {
        self.content
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(self.name.as_str())
            .to_string()
    }

    pub fn description(&self) -> Option<&str> {
        self.content.get("description").and_then(Value::as_str)
    }
}

/// An in-progress walk through a form.
pub struct Session<F: Form> {
    form: F,
    values: Map<String, Value>,
    fields: Fields,
    asked: HashSet<FieldPath>,
    retry: Vec<FieldPath>,
}

impl<F: Form> Session<F> {
    /// Start a session with no values.
    pub fn new(form: F) -> Result<Self, FieldsError> {
        Self::with_values(form, Map::new())
    }

    /// Start a session from values already known.
    pub fn with_values(form: F, values: Map<String, Value>) -> Result<Self, FieldsError> {
        let fields = form.build(&values)?;
        Ok(Self {
            form,
            values,
            fields,
            asked: HashSet::new(),
            retry: Vec::new(),
        })
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Values collected so far, nested like the tree.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Path of the next field to ask about.
    ///
    /// Fields whose last answer was rejected come first, then the first leaf
    /// never answered.
    pub fn next(&self) -> Option<FieldPath> {
        self.retry
            .iter()
            .find(|path| self.fields.field_at_path(path).is_some())
            .cloned()
            .or_else(|| self.fields.next_unanswered(&self.asked))
    }

    /// Describe the field at `path`, resolving content against its siblings.
    pub fn prompt(&self, path: &[String]) -> Result<Prompt, FieldsError> {
        let unknown = || FieldsError::UnknownPath { path: path.to_vec() };
        let (_, parent) = path.split_last().ok_or_else(unknown)?;
        let scope = if parent.is_empty() {
            &self.fields
        } else {
            self.fields
                .field_at_path(parent)
                .and_then(Field::fields)
                .ok_or_else(unknown)?
        };
        let field = self.fields.field_at_path(path).ok_or_else(unknown)?;

        Ok(Prompt {
            path: path.to_vec(),
            name: field.name.clone(),
            content: template::render_content(scope, field),
            options: field.options.clone(),
            default: field.default.clone(),
            multi: field.multi,
            required: field.required,
            errors: field.errors.clone(),
        })
    }

    /// Apply an answer to the field at `path`.
    ///
    /// A valid answer is recorded; if the field is a trigger the tree is
    /// rebuilt from the recorded values.
    pub fn answer(&mut self, path: &[String], answer: Answer) -> Result<Answered, FieldsError> {
        let field = self
            .fields
            .field_at_path_mut(path)
            .ok_or_else(|| FieldsError::UnknownPath { path: path.to_vec() })?;

        let answered = field.answer(answer);
        self.retry.retain(|queued| queued.as_slice() != path);
        if !answered.valid {
            self.retry.insert(0, path.to_vec());
            return Ok(answered);
        }

        let trigger = field.trigger;
        if let Some(value) = field.value.clone() {
            insert_at(&mut self.values, path, value);
        }
        self.asked.insert(path.to_vec());

        if trigger {
            tracing::debug!(path = %path.join("."), "Trigger answered, rebuilding fields");
            self.fields = self.form.build(&self.values)?;
            let fields = &self.fields;
            self.retry.retain(|queued| fields.field_at_path(queued).is_some());
        }

        Ok(answered)
    }

    /// Validate the whole tree.
    ///
    /// On success returns every leaf value flattened by name. On failure the
    /// failing fields that can still be answered are queued to be asked again
    /// and `None` is returned.
    pub fn finish(&mut self) -> Option<Map<String, Value>> {
        if self.fields.validate(true) {
            return Some(self.fields.leaf_values());
        }

        let mut failing = Vec::new();
        collect_failing(&self.fields, &mut Vec::new(), &mut failing);
        for path in failing {
            if !self.retry.contains(&path) {
                self.retry.push(path);
            }
        }
        None
    }
}

fn collect_failing(fields: &Fields, prefix: &mut FieldPath, out: &mut Vec<FieldPath>) {
    for field in fields {
        prefix.push(field.name.clone());
        match field.fields() {
            Some(nested) => collect_failing(nested, prefix, out),
            None if !field.errors.is_empty() && !field.readonly => out.push(prefix.clone()),
            None => {}
        }
        prefix.pop();
    }
}

/// Store `value` at `path`, creating nested mappings for groups.
fn insert_at(values: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut target = values;
    for name in parents {
        let slot = target
            .entry(name.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        target = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    target.insert(last.clone(), value);
}
