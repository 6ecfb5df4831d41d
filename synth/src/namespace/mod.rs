//! The namespace tree.
//!
//! A [`Namespace`] is a named, ordered collection of generated definitions
//! with one generation responsibility. Every namespace moves through
//! [`NamespaceState::Constructed`], [`NamespaceState::Initializing`], and
//! [`NamespaceState::Finalized`], never backwards. Definitions can only be
//! added while initializing; once finalized the namespace is read-only and any
//! further mutation is a [`GenerationError::NamespaceStateViolation`].
//!
//! The concrete namespaces wrap a `Namespace<D>` with their own population
//! logic:
//!
//! - [`ServiceNamespace`]: root naming, built from configuration.
//! - [`SupportNamespace`]: runtime-support types introduced by overrides.
//! - [`ModelExtensionsNamespace`]: one definition per model type.
//! - [`CmdletNamespace`]: one command per verb-noun, built asynchronously.
//! - [`ModelCmdletNamespace`]: optional per-model construction commands.

mod cmdlet;
mod model_cmdlet;
mod model_extensions;
mod service;
mod support;

use std::collections::HashMap;
use std::fmt;

use cmdlet_synth_core::SchemaModel;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{Checkpoint, GenerationError, Result};
use crate::resolver::{TypeRegistry, TypeResolver};

pub use cmdlet::{
    CmdletDefinition, CmdletName, CmdletNamespace, CmdletNamespaceBuilder, CmdletVariant,
    ParameterDefinition, cmdlet_name,
};
pub use model_cmdlet::ModelCmdletNamespace;
pub use model_extensions::{ModelExtensionsNamespace, ModelKind, ModelTypeDefinition, PropertyDefinition};
pub use service::ServiceNamespace;
pub use support::{SupportNamespace, SupportTypeDefinition};

/// Lifecycle of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceState {
    Constructed,
    Initializing,
    Finalized,
}

impl fmt::Display for NamespaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Constructed => "constructed",
            Self::Initializing => "initializing",
            Self::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Anything a namespace can hold: it only needs a unique name.
pub trait Definition {
    fn name(&self) -> &str;
}

/// Ordered, named definitions plus lifecycle state.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::{Definition, Namespace, NamespaceState};
///
/// struct Item(String);
/// impl Definition for Item {
///     fn name(&self) -> &str { &self.0 }
/// }
///
/// let mut ns = Namespace::new("Contoso.Models");
/// assert!(ns.insert(Item("Widget".into())).is_err()); // not initializing yet
///
/// ns.begin().unwrap();
/// ns.insert(Item("Widget".into())).unwrap();
/// ns.finalize().unwrap();
///
/// assert_eq!(ns.state(), NamespaceState::Finalized);
/// assert!(ns.get("Widget").is_some());
/// assert!(ns.insert(Item("Gadget".into())).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Namespace<D> {
    full_name: String,
    state: NamespaceState,
    definitions: Vec<D>,
    index: HashMap<String, usize>,
}

impl<D: Definition> Namespace<D> {
    pub fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            state: NamespaceState::Constructed,
            definitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn state(&self) -> NamespaceState {
        self.state
    }

    /// Constructed -> Initializing.
    pub fn begin(&mut self) -> Result<()> {
        if self.state != NamespaceState::Constructed {
            return Err(self.violation());
        }
        self.transition(NamespaceState::Initializing);
        Ok(())
    }

    /// Seals the namespace. A namespace that was never populated may be
    /// finalized straight from Constructed.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == NamespaceState::Finalized {
            return Err(self.violation());
        }
        self.transition(NamespaceState::Finalized);
        Ok(())
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// [`GenerationError::NamespaceStateViolation`] outside the initializing
    /// phase and [`GenerationError::DuplicateDefinition`] when the name is
    /// already taken.
    pub fn insert(&mut self, definition: D) -> Result<()> {
        if self.state != NamespaceState::Initializing {
            return Err(self.violation());
        }
        let name = definition.name().to_string();
        if self.index.contains_key(&name) {
            return Err(GenerationError::DuplicateDefinition {
                namespace: self.full_name.clone(),
                name,
            });
        }
        self.index.insert(name, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// Mutable access to an existing definition while initializing.
    pub fn get_mut(&mut self, name: &str) -> Result<Option<&mut D>> {
        if self.state != NamespaceState::Initializing {
            return Err(self.violation());
        }
        Ok(self.index.get(name).map(|&i| &mut self.definitions[i]))
    }

    pub fn get(&self, name: &str) -> Option<&D> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn transition(&mut self, next: NamespaceState) {
        debug!(namespace = %self.full_name, from = %self.state, to = %next, "namespace state change");
        self.state = next;
    }

    fn violation(&self) -> GenerationError {
        GenerationError::NamespaceStateViolation {
            namespace: self.full_name.clone(),
            state: self.state,
        }
    }
}

impl<D: Serialize> Serialize for Namespace<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Namespace", 2)?;
        state.serialize_field("name", &self.full_name)?;
        state.serialize_field("definitions", &self.definitions)?;
        state.end()
    }
}

/// Shared state threaded through namespace population.
///
/// Holds the read-only inputs, the run's type registry, and the checkpoint
/// that collects recoverable errors.
pub struct SynthesisContext<'a> {
    pub model: &'a SchemaModel,
    pub resolver: &'a TypeResolver,
    pub registry: TypeRegistry,
    pub checkpoint: &'a mut Checkpoint,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(model: &'a SchemaModel, resolver: &'a TypeResolver, checkpoint: &'a mut Checkpoint) -> Self {
        Self {
            model,
            resolver,
            registry: TypeRegistry::default(),
            checkpoint,
        }
    }
}
