//! Form documents: field specs stored as YAML or JSON.
//!
//! Documents are structured data validated against JSON Schema before any
//! field is built from them.

mod parser;
mod schema;

pub use parser::{FormDocument, SpecError};
pub use schema::validate_document_schema;
