//! Namespace and type synthesis for generated PowerShell cmdlet modules.
//!
//! Given a [`SchemaModel`](cmdlet_synth_core::SchemaModel) and a
//! [`ConfigSource`], [`ProjectAssembler`] derives the full tree of generated
//! types, commands, and naming decisions for one module:
//!
//! ```text
//! ServiceNamespace           Contoso
//! ├── SupportNamespace       Contoso.Support        (override support types)
//! ├── ModelExtensions        Contoso.Models         (one type per schema)
//! ├── CmdletNamespace        Contoso.Cmdlets        (one command per verb-noun)
//! │                          Contoso.Cmdlets.Models (inline operation types)
//! └── ModelCmdletNamespace   Contoso.ModelCmdlets   (optional New-*Object)
//! ```
//!
//! Schemas map to target declarations through the [`TypeResolver`]; the
//! built-in [`TypeOverride::switch_parameter`] turns booleans into switch
//! parameters. Errors found along the way are collected on a [`Checkpoint`],
//! and a run that recorded any of them yields no [`Project`] and emits
//! nothing. A finished project stages its descriptor and JSON project model
//! through a [`Writer`], with the legacy-runtime [`OverrideTable`] applied to
//! every text.
//!
//! The crate installs no `tracing` subscriber; embedders choose one.

mod config;
mod descriptor;
mod error;
mod namespace;
mod overrides;
mod project;
mod resolver;
mod writer;

pub use config::{ConfigError, ConfigLoader, ConfigSource, Metadata, YamlConfig};
pub use descriptor::{CsprojDescriptor, DescriptorFormat};
pub use error::{Checkpoint, CheckpointError, GenerationError, Result};
pub use namespace::{
    CmdletDefinition, CmdletName, CmdletNamespace, CmdletNamespaceBuilder, CmdletVariant, Definition,
    ModelCmdletNamespace, ModelExtensionsNamespace, ModelKind, ModelTypeDefinition, Namespace, NamespaceState,
    ParameterDefinition, PropertyDefinition, ServiceNamespace, SupportNamespace, SupportTypeDefinition,
    SynthesisContext, cmdlet_name,
};
pub use overrides::OverrideTable;
pub use project::{ACCOUNTS_VERSION_MINIMUM, Folders, Project, ProjectAssembler, ProjectFiles, ProjectSettings};
pub use resolver::{
    EnhancedTypeDeclaration, GeneratedTypeRef, JsonType, SWITCH_PARAMETER, SupportType, TypeOverride,
    TypeRegistry, TypeResolver,
};
pub use writer::{ContentType, MemoryWriter, StagedFile, WriteError, Writer};
