//! Schema model, API description decoding, and naming rules.
//!
//! This crate defines the input side of cmdlet synthesis:
//!
//! - [`SchemaModel`]: an immutable arena of [`Schema`] nodes plus the API's
//!   [`Operation`]s. Nodes are addressed by [`SchemaId`]; identity, not shape,
//!   decides whether two references are the same type.
//! - [`ModelBuilder`]: programmatic construction, including forward
//!   references for cyclic graphs.
//! - [`SchemaModel::from_yaml_str`] / [`SchemaModel::from_json_str`]: decode
//!   an API description document.
//! - [`naming`]: identifier deconstruction and casing used by every generated
//!   name.
//!
//! Validation ([`validate_model`]) reports structural problems such as
//! duplicate schema names or operation ids.
//!
//! # Example
//!
//! ```
//! use cmdlet_synth_core::*;
//!
//! let model = SchemaModel::from_yaml_str(r#"
//! info: { title: Contoso, version: "1.0" }
//! schemas:
//!   Widget:
//!     type: object
//!     required: [name]
//!     properties:
//!       name: { type: string }
//!       count: { type: integer }
//! operations:
//!   - operationId: listWidgets
//!     response: { type: array, items: { $ref: Widget } }
//! "#).unwrap();
//!
//! assert_eq!(model.info().title, "Contoso");
//! assert!(model.lookup("Widget").is_some());
//! assert_eq!(model.operations()[0].operation_id, "listWidgets");
//! assert!(validate_model(&model).is_empty());
//! ```

mod document;
mod error;
pub mod naming;
mod types;
mod validate;

pub use error::{DocumentError, Result};
pub use types::*;
pub use validate::{ModelIssue, validate_model};
