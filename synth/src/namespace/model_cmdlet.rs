use cmdlet_synth_core::ParameterLocation;
use cmdlet_synth_core::naming::to_pascal_case;
use tracing::debug;

use super::{
    CmdletDefinition, CmdletName, CmdletNamespace, CmdletVariant, ModelExtensionsNamespace, ModelKind, Namespace,
    ParameterDefinition, ServiceNamespace,
};
use crate::error::Result;
use crate::resolver::{EnhancedTypeDeclaration, JsonType};

/// `{ns}.ModelCmdlets`: optional `New-{prefix}{subject-prefix}{Model}Object`
/// commands, one per generated class.
///
/// Constructed as an empty placeholder before the other namespaces and either
/// populated or sealed empty once they exist.
#[derive(Debug, Clone)]
pub struct ModelCmdletNamespace {
    namespace: Namespace<CmdletDefinition>,
}

impl ModelCmdletNamespace {
    pub fn new(service: &ServiceNamespace) -> Self {
        Self {
            namespace: Namespace::new(&service.child("ModelCmdlets")),
        }
    }

    /// Creates one construction command per class in `models`.
    pub fn materialize(&mut self, models: &ModelExtensionsNamespace, cmdlets: &CmdletNamespace) -> Result<()> {
        self.namespace.begin()?;
        for model in models.namespace().iter().filter(|m| m.kind == ModelKind::Class) {
            let name = CmdletName {
                verb: "New".to_string(),
                noun: format!(
                    "{}{}{}Object",
                    to_pascal_case(cmdlets.prefix()),
                    to_pascal_case(cmdlets.subject_prefix()),
                    model.name
                ),
            };
            debug!(cmdlet = %name, model = %model.full_name, "model cmdlet synthesized");

            let parameters = model
                .properties
                .iter()
                .map(|property| ParameterDefinition {
                    name: property.name.clone(),
                    serialized_name: property.serialized_name.clone(),
                    location: ParameterLocation::Body,
                    type_declaration: property.type_declaration.clone(),
                    required: property.required,
                    position: None,
                    aliases: Vec::new(),
                    description: property.description.clone(),
                })
                .collect();

            let mut definition = CmdletDefinition::new(&name);
            definition.add_variant(CmdletVariant {
                name: "Default".to_string(),
                operation_id: None,
                class_name: format!("{}{}_Default", name.verb, name.noun),
                parameters,
                output_type: Some(EnhancedTypeDeclaration::reference(
                    &model.full_name,
                    true,
                    JsonType::Object,
                    None,
                    None,
                )),
                description: model.description.clone(),
            });
            self.namespace.insert(definition)?;
        }
        self.namespace.finalize()
    }

    /// Seals the namespace empty when model cmdlets are disabled.
    pub fn skip(&mut self) -> Result<()> {
        debug!(namespace = %self.namespace.full_name(), "model cmdlets skipped");
        self.namespace.finalize()
    }

    pub fn namespace(&self) -> &Namespace<CmdletDefinition> {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&CmdletDefinition> {
        self.namespace.get(name)
    }
}

#[cfg(test)]
mod tests {
    use cmdlet_synth_core::{ModelBuilder, PrimitiveType, Schema, SchemaKind};

    use super::*;
    use crate::config::YamlConfig;
    use crate::error::{Checkpoint, GenerationError};
    use crate::namespace::{CmdletNamespaceBuilder, NamespaceState, SynthesisContext};
    use crate::resolver::TypeResolver;

    #[tokio::test]
    async fn test_one_command_per_class() {
        let mut builder = ModelBuilder::new("Api", "1");
        let name = builder.add_schema(Schema::new(SchemaKind::Primitive(PrimitiveType::String), "n"));
        builder.declare(
            "Widget",
            Schema::new(SchemaKind::Object, "schemas/Widget").with_property("name", name, true),
        );
        builder.declare(
            "Color",
            Schema::new(SchemaKind::Enum, "schemas/Color").with_enum_values(["red"]),
        );
        let model = builder.build();
        let resolver = TypeResolver::new();
        let mut checkpoint = Checkpoint::new();
        let service = ServiceNamespace::new("Api", "Api");
        let config = YamlConfig::new().with_value("prefix", "Az");

        let mut model_cmdlets = ModelCmdletNamespace::new(&service);
        let mut ctx = SynthesisContext::new(&model, &resolver, &mut checkpoint);
        let models = ModelExtensionsNamespace::new(&service, &mut ctx).unwrap();
        let cmdlets = CmdletNamespaceBuilder::new(&service)
            .initialize(&config, &mut ctx)
            .await
            .unwrap();
        model_cmdlets.materialize(&models, &cmdlets).unwrap();

        assert_eq!(model_cmdlets.namespace().len(), 1);
        let new_widget = model_cmdlets.get("New-AzWidgetObject").unwrap();
        let variant = &new_widget.variants[0];
        assert_eq!(variant.output_type.as_ref().unwrap().declaration, "Api.Models.Widget");
        let param = variant.parameter("Name").unwrap();
        assert!(param.required);
        assert_eq!(param.location, ParameterLocation::Body);
    }

    #[test]
    fn test_skip_seals_empty() {
        let service = ServiceNamespace::new("Api", "Api");
        let mut model_cmdlets = ModelCmdletNamespace::new(&service);
        assert_eq!(model_cmdlets.namespace().state(), NamespaceState::Constructed);

        model_cmdlets.skip().unwrap();

        assert!(model_cmdlets.namespace().is_empty());
        assert!(matches!(
            model_cmdlets.skip(),
            Err(GenerationError::NamespaceStateViolation { .. })
        ));
    }
}
