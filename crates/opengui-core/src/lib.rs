//! # opengui-core
//!
//! Dynamic form definition and validation engine.
//!
//! A form is a tree of named [`Field`]s held in ordered [`Fields`]
//! collections. Trees are built from specs plus a map of current values,
//! grown dynamically as earlier answers decide which fields come next,
//! validated depth-first, and serialized to plain JSON for transport.
//!
//! ## Key Guarantees
//!
//! 1. **Data errors are data**: failed checks land on `errors` lists, never in a `Result`
//! 2. **Structural errors abort**: missing or duplicate names return [`FieldsError`]
//! 3. **Stable order**: fields keep insertion order through validation and serialization
//!
//! ## Example
//!
//! ```rust
//! use opengui_core::{FieldSpec, Fields};
//! use serde_json::json;
//!
//! let mut values = serde_json::Map::new();
//! values.insert("types".into(), json!(["textarea"]));
//!
//! let mut fields = Fields::builder()
//!     .values(values)
//!     .fields([FieldSpec::new("types")
//!         .options(["textarea", "options", "fields"])
//!         .multi(true)
//!         .trigger(true)])
//!     .build()?;
//!
//! if fields["types"].value == Some(json!(["textarea"])) {
//!     fields.append(FieldSpec::new("people").required(true))?;
//! }
//!
//! assert!(!fields.validate(true));
//! assert_eq!(fields["people"].errors, vec!["missing value"]);
//! # Ok::<(), opengui_core::FieldsError>(())
//! ```

pub mod adapter;
pub mod document;
pub mod field;
pub mod fields;
pub mod prompt;
pub mod spec;
pub mod template;
pub mod validation;
pub mod value;
pub mod wizard;

// Re-export main types at crate root
pub use adapter::Response;
pub use document::{FormDocument, SpecError};
pub use field::{Field, FieldKind};
pub use fields::{FieldKey, FieldPath, Fields, FieldsBuilder, FieldsError, ValueSource};
pub use prompt::{Answer, Answered, Form, Prompt, Session};
pub use spec::{split, Attribute, FieldSpec};
pub use validation::{CrossCheck, Predicate, Validation};
pub use wizard::Example;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
