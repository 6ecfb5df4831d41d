//! Error types for API description decoding.

use thiserror::Error;

/// Errors that can occur while decoding an API description.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `$ref` names a schema that is not in the schema table.
    #[error("unresolved reference '{reference}' at {path}")]
    UnresolvedReference { path: String, reference: String },

    /// A schema is well-formed but cannot be turned into a model node.
    #[error("invalid schema at {path}: {reason}")]
    InvalidSchema { path: String, reason: String },
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
