//! Structural validation of a schema model.
//!
//! Catches problems that decode fine but would produce ambiguous or broken
//! generated code, such as duplicate schema names, duplicate operation ids,
//! and `required` entries naming properties that do not exist.
//!
//! # Examples
//!
//! ```
//! use cmdlet_synth_core::*;
//!
//! let mut builder = ModelBuilder::new("Contoso", "1.0");
//! builder.declare("Widget", Schema::new(SchemaKind::Object, "schemas/Widget"));
//! assert!(validate_model(&builder.clone().build()).is_empty());
//!
//! builder.add_operation(Operation::new("listWidgets"));
//! builder.add_operation(Operation::new("listWidgets"));
//! let issues = validate_model(&builder.build());
//! assert_eq!(issues, vec![ModelIssue::DuplicateOperationId("listWidgets".into())]);
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Schema, SchemaKind, SchemaModel};

/// Model validation issues.
///
/// Each variant describes one structural problem. Validation reports every
/// issue it finds rather than stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelIssue {
    /// A top-level schema has an empty or whitespace-only name.
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    /// Two top-level schemas share a name.
    #[error("duplicate schema name: {0}")]
    DuplicateSchemaName(String),
    /// An operation has an empty id.
    #[error("operation id cannot be empty")]
    EmptyOperationId,
    /// Two operations share an id.
    #[error("duplicate operation id: {0}")]
    DuplicateOperationId(String),
    /// One operation declares the same parameter twice.
    #[error("duplicate parameter '{parameter}' in operation {operation}")]
    DuplicateParameter { operation: String, parameter: String },
    /// A `required` entry names a property the object does not have.
    #[error("required property '{property}' is not declared at {path}")]
    RequiredPropertyMissing { path: String, property: String },
}

/// Validates a schema model.
///
/// Checks the top-level schema table, every object node, and every operation.
pub fn validate_model(model: &SchemaModel) -> Vec<ModelIssue> {
    let mut issues = Vec::new();

    let mut seen_names: HashSet<&str> = HashSet::new();
    for (name, _) in model.named_schemas() {
        if name.trim().is_empty() {
            issues.push(ModelIssue::EmptySchemaName);
        } else if !seen_names.insert(name) {
            issues.push(ModelIssue::DuplicateSchemaName(name.to_string()));
        }
    }

    for (_, schema) in model.schemas() {
        issues.extend(validate_object(schema));
    }

    let mut seen_ops: HashSet<&str> = HashSet::new();
    for op in model.operations() {
        let id = op.operation_id.trim();
        if id.is_empty() {
            issues.push(ModelIssue::EmptyOperationId);
            continue;
        }
        if !seen_ops.insert(id) {
            issues.push(ModelIssue::DuplicateOperationId(id.to_string()));
        }

        let mut seen_params: HashSet<&str> = HashSet::new();
        for param in &op.parameters {
            if !seen_params.insert(param.name.as_str()) {
                issues.push(ModelIssue::DuplicateParameter {
                    operation: id.to_string(),
                    parameter: param.name.clone(),
                });
            }
        }
    }

    issues
}

fn validate_object(schema: &Schema) -> Vec<ModelIssue> {
    if schema.kind() != &SchemaKind::Object {
        return Vec::new();
    }
    schema
        .required
        .iter()
        .filter(|r| !schema.properties.iter().any(|p| &p.name == *r))
        .map(|r| ModelIssue::RequiredPropertyMissing {
            path: schema.path.clone(),
            property: r.clone(),
        })
        .collect()
}
