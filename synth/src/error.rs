//! Error types and the abort-or-emit checkpoint.
//!
//! Configuration and schema-visitation problems are not thrown where they are
//! found. They are recorded on a [`Checkpoint`] and the run keeps going, so a
//! single pass reports every problem. The checkpoint at the end of assembly is
//! the one place that decides whether anything may be emitted.

use std::fmt;

use cmdlet_synth_core::ModelIssue;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::namespace::NamespaceState;

/// Problems found while assembling a project.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// A required configuration key has no value and no default.
    #[error("missing configuration value '{key}'")]
    MissingConfiguration { key: String },

    /// A configuration value is present but has the wrong shape.
    #[error("invalid configuration value '{key}': {reason}")]
    InvalidConfiguration { key: String, reason: String },

    /// The type resolver met a schema shape it cannot map.
    #[error("unsupported schema kind '{kind}' at {path}")]
    UnsupportedSchemaKind { path: String, kind: String },

    /// A namespace was mutated outside its initializing phase.
    #[error("namespace {namespace} is {state} and cannot be modified")]
    NamespaceStateViolation {
        namespace: String,
        state: NamespaceState,
    },

    /// Two definitions with one name were inserted into a namespace.
    #[error("namespace {namespace} already defines {name}")]
    DuplicateDefinition { namespace: String, name: String },

    /// The schema model failed structural validation.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelIssue),
}

impl GenerationError {
    /// Returns `true` for programming-invariant violations that stop assembly
    /// immediately instead of being collected.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NamespaceStateViolation { .. } | Self::DuplicateDefinition { .. }
        )
    }
}

/// Convenience alias for results with [`GenerationError`].
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Accumulates errors across one generation run.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::{Checkpoint, GenerationError};
///
/// let mut checkpoint = Checkpoint::new();
/// assert!(checkpoint.is_clean());
///
/// checkpoint.record(GenerationError::MissingConfiguration { key: "module-name".into() });
/// checkpoint.record(GenerationError::MissingConfiguration { key: "dll-name".into() });
///
/// let err = checkpoint.check().unwrap_err();
/// assert_eq!(err.errors().len(), 2);
/// assert!(err.to_string().contains("module-name"));
/// ```
#[derive(Debug, Default)]
pub struct Checkpoint {
    errors: Vec<GenerationError>,
}

impl Checkpoint {
    /// Creates an empty checkpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one error and keeps going.
    ///
    /// An error equal to one already recorded is dropped, so a schema reached
    /// from several places is reported once.
    pub fn record(&mut self, error: GenerationError) {
        if self.errors.contains(&error) {
            debug!(error = %error, "duplicate generation error ignored");
            return;
        }
        warn!(error = %error, "generation error recorded");
        self.errors.push(error);
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded so far, oldest first.
    pub fn errors(&self) -> &[GenerationError] {
        &self.errors
    }

    /// Decides abort-vs-emit.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckpointError`] carrying every recorded error when at
    /// least one was recorded.
    pub fn check(self) -> std::result::Result<(), CheckpointError> {
        if self.errors.is_empty() {
            info!("checkpoint passed");
            Ok(())
        } else {
            Err(self.abort())
        }
    }

    /// Ends the run unconditionally with whatever was recorded.
    pub fn abort(self) -> CheckpointError {
        warn!(count = self.errors.len(), "generation aborted at checkpoint");
        CheckpointError {
            errors: self.errors,
        }
    }
}

/// A run that stopped at the checkpoint. Nothing may be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointError {
    errors: Vec<GenerationError>,
}

impl CheckpointError {
    /// Every error that led to the abort.
    pub fn errors(&self) -> &[GenerationError] {
        &self.errors
    }
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation aborted with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckpointError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_checkpoint_passes() {
        assert!(Checkpoint::new().check().is_ok());
    }

    #[test]
    fn test_abort_keeps_order() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.record(GenerationError::UnsupportedSchemaKind {
            path: "schemas/Upload".into(),
            kind: "file".into(),
        });
        checkpoint.record(GenerationError::MissingConfiguration {
            key: "module-version".into(),
        });

        let err = checkpoint.abort();
        assert!(matches!(
            err.errors()[0],
            GenerationError::UnsupportedSchemaKind { .. }
        ));
        assert_eq!(
            err.to_string(),
            "generation aborted with 2 error(s)\n  \
             - unsupported schema kind 'file' at schemas/Upload\n  \
             - missing configuration value 'module-version'"
        );
    }

    #[test]
    fn test_repeated_error_is_recorded_once() {
        let unsupported = GenerationError::UnsupportedSchemaKind {
            path: "schemas/Pet".into(),
            kind: "polymorphic-union without discriminator".into(),
        };
        let mut checkpoint = Checkpoint::new();
        checkpoint.record(unsupported.clone());
        checkpoint.record(GenerationError::MissingConfiguration { key: "dll-name".into() });
        checkpoint.record(unsupported.clone());

        let err = checkpoint.abort();
        assert_eq!(err.errors().len(), 2);
        assert_eq!(err.errors()[0], unsupported);
    }

    #[test]
    fn test_invariant_violations() {
        let violation = GenerationError::NamespaceStateViolation {
            namespace: "Contoso.Models".into(),
            state: NamespaceState::Finalized,
        };
        assert!(violation.is_invariant_violation());
        assert!(!GenerationError::MissingConfiguration { key: "x".into() }.is_invariant_violation());
    }
}
