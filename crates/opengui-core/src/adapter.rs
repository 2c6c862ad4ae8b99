//! Request/response contract for serving a form over HTTP.
//!
//! No server lives here. Each handler takes the decoded JSON request body and
//! returns the status and body a transport should send back.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::fields::FieldsError;
use crate::prompt::Form;

/// Status and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `{"values": {...}}` from a request; absent or null means no values.
fn request_values(request: &Value) -> Map<String, Value> {
    match request.get("values") {
        Some(Value::Object(values)) => values.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            tracing::warn!(values = %other, "Ignoring non-object request values");
            Map::new()
        }
    }
}

/// Liveness check.
pub fn health() -> Response {
    Response::new(200, json!({"message": "OK"}))
}

/// Build and validate the form for the request's values.
///
/// Always 200; the body carries the fields, their errors and `ready`, so
/// clients can go back and forth while filling the form in.
pub fn options<F: Form + ?Sized>(form: &F, request: &Value) -> Result<Response, FieldsError> {
    let mut fields = form.build(&request_values(request))?;
    fields.validate(true);
    Ok(Response::new(200, fields.to_dict()))
}

/// Submit the request's values: 201 when they validate, 400 with the
/// annotated fields when they don't.
pub fn submit<F: Form + ?Sized>(form: &F, request: &Value) -> Result<Response, FieldsError> {
    let mut fields = form.build(&request_values(request))?;

    if !fields.validate(true) {
        tracing::debug!(errors = ?fields.errors, "Rejected submission");
        return Ok(Response::new(400, fields.to_dict()));
    }

    Ok(Response::new(201, json!({"message": "created"})))
}
