use std::collections::HashSet;

use cmdlet_synth_core::naming::{to_pascal_case, unique_name};
use cmdlet_synth_core::{SchemaId, SchemaKind};
use serde::Serialize;
use tracing::{debug, warn};

use super::{Definition, Namespace, ServiceNamespace, SynthesisContext};
use crate::error::Result;
use crate::resolver::EnhancedTypeDeclaration;

/// Shape of a generated model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Class,
    Enum,
    Union,
}

/// One property of a generated class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub serialized_name: String,
    pub required: bool,
    pub type_declaration: EnhancedTypeDeclaration,
    pub description: Option<String>,
}

/// A generated model type plus its helper names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelTypeDefinition {
    pub name: String,
    pub full_name: String,
    pub kind: ModelKind,
    pub schema: SchemaId,
    pub description: Option<String>,
    pub properties: Vec<PropertyDefinition>,
    pub enum_values: Vec<String>,
    /// Union member declarations.
    pub variants: Vec<String>,
    pub discriminator: Option<String>,
    /// Type-converter helper generated alongside classes.
    pub type_converter: Option<String>,
}

impl Definition for ModelTypeDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ModelTypeDefinition {
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// `{ns}.Models`: every type reachable from the schema table.
#[derive(Debug, Clone)]
pub struct ModelExtensionsNamespace {
    namespace: Namespace<ModelTypeDefinition>,
}

impl ModelExtensionsNamespace {
    /// Visits the schema table in declaration order and materializes every
    /// generated type it reaches.
    ///
    /// Resolution failures are recorded on the checkpoint and the visit
    /// continues; only lifecycle violations are returned.
    pub fn new(service: &ServiceNamespace, ctx: &mut SynthesisContext<'_>) -> Result<Self> {
        let mut namespace = Namespace::new(&service.child("Models"));
        namespace.begin()?;
        ctx.registry.set_owner(namespace.full_name());

        for (name, id) in ctx.model.named_schemas() {
            debug!(schema = name, "visiting schema");
            if let Err(e) = ctx.resolver.resolve_type_declaration(ctx.model, id, true, &mut ctx.registry) {
                ctx.checkpoint.record(e);
            }
        }
        materialize_pending(&mut namespace, ctx)?;

        namespace.finalize()?;
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &Namespace<ModelTypeDefinition> {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&ModelTypeDefinition> {
        self.namespace.get(name)
    }
}

/// Defines every queued generated type in `namespace`, in queue order.
///
/// Materializing a type resolves its members, which may queue further types;
/// those are drained in the same pass.
pub(crate) fn materialize_pending(
    namespace: &mut Namespace<ModelTypeDefinition>,
    ctx: &mut SynthesisContext<'_>,
) -> Result<()> {
    while let Some(id) = ctx.registry.next_pending() {
        let Some(generated) = ctx.registry.lookup(id).cloned() else {
            continue;
        };
        let schema = ctx.model.schema(id);
        debug!(r#type = %generated.full_name(), path = %schema.path, "materializing type");

        let mut definition = ModelTypeDefinition {
            name: generated.name.clone(),
            full_name: generated.full_name(),
            kind: ModelKind::Class,
            schema: id,
            description: schema.description.clone(),
            properties: Vec::new(),
            enum_values: Vec::new(),
            variants: Vec::new(),
            discriminator: None,
            type_converter: None,
        };

        match schema.kind() {
            SchemaKind::Enum => {
                definition.kind = ModelKind::Enum;
                definition.enum_values = schema.enum_values.clone();
            }
            SchemaKind::Union => {
                definition.kind = ModelKind::Union;
                definition.discriminator = schema.discriminator.clone();
                for &variant in &schema.variants {
                    match ctx.resolver.resolve_type_declaration(ctx.model, variant, true, &mut ctx.registry) {
                        Ok(decl) => definition.variants.push(decl.declaration),
                        Err(e) => ctx.checkpoint.record(e),
                    }
                }
            }
            _ => {
                definition.type_converter = Some(format!("{}TypeConverter", generated.name));
                let mut taken = HashSet::new();
                for property in &schema.properties {
                    let required = schema.is_required(&property.name);
                    let decl = match ctx.resolver.resolve_type_declaration(
                        ctx.model,
                        property.schema,
                        required,
                        &mut ctx.registry,
                    ) {
                        Ok(decl) => decl,
                        Err(e) => {
                            ctx.checkpoint.record(e);
                            continue;
                        }
                    };
                    let name = property_name(&taken, &property.name, &generated.name);
                    taken.insert(name.clone());
                    definition.properties.push(PropertyDefinition {
                        name,
                        serialized_name: property.name.clone(),
                        required,
                        type_declaration: decl,
                        description: ctx.model.schema(property.schema).description.clone(),
                    });
                }
            }
        }

        namespace.insert(definition)?;
    }
    Ok(())
}

/// PascalCase member name, kept clear of the enclosing type's name and of
/// earlier members.
fn property_name(taken: &HashSet<String>, wire_name: &str, type_name: &str) -> String {
    let mut candidate = to_pascal_case(wire_name);
    if candidate.is_empty() {
        candidate = "Property".to_string();
    }
    if candidate == type_name {
        candidate.push_str("Property");
    }
    let name = unique_name(taken, &candidate);
    if name != candidate {
        warn!(property = wire_name, name = %name, "property name collision resolved by suffix");
    }
    name
}
