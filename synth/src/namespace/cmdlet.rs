use std::collections::HashSet;
use std::fmt;

use cmdlet_synth_core::naming::{deconstruct, pascal_case, to_pascal_case, unique_name};
use cmdlet_synth_core::{Operation, ParameterLocation};
use serde::Serialize;
use tracing::{debug, warn};

use super::model_extensions::materialize_pending;
use super::{Definition, ModelTypeDefinition, Namespace, ServiceNamespace, SynthesisContext};
use crate::config::{ConfigLoader, ConfigSource};
use crate::error::Result;
use crate::resolver::EnhancedTypeDeclaration;

/// Verb-noun command name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CmdletName {
    pub verb: String,
    pub noun: String,
}

impl fmt::Display for CmdletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.verb, self.noun)
    }
}

/// Derives a command name from an operation id.
///
/// The first word of the id is the verb and the rest is the subject.
/// `Group_Action` ids take the verb from the first word of the action and use
/// the group alone as the subject; the rest of the action stays in the
/// variant name. An id with no subject falls back to the service name. The noun
/// is `{prefix}{subject_prefix}{subject}`.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::cmdlet_name;
///
/// assert_eq!(cmdlet_name("listWidgets", "", "", "Contoso").to_string(), "List-Widgets");
/// assert_eq!(cmdlet_name("listWidgets", "Az", "Contoso", "Contoso").to_string(), "List-AzContosoWidgets");
/// assert_eq!(cmdlet_name("Widgets_CreateOrUpdate", "", "", "Contoso").to_string(), "Create-Widgets");
/// assert_eq!(cmdlet_name("ping", "", "", "Contoso").to_string(), "Ping-Contoso");
/// ```
pub fn cmdlet_name(operation_id: &str, prefix: &str, subject_prefix: &str, service_name: &str) -> CmdletName {
    let (group, action) = match operation_id.split_once('_') {
        Some((group, action)) if !deconstruct(action).is_empty() => (deconstruct(group), deconstruct(action)),
        _ => (Vec::new(), deconstruct(operation_id)),
    };

    let (verb, rest) = match action.split_first() {
        Some((verb, rest)) => (pascal_case(std::slice::from_ref(verb)), rest.to_vec()),
        None => ("Invoke".to_string(), Vec::new()),
    };
    let mut subject = if group.is_empty() { rest } else { group };
    if subject.is_empty() {
        subject = deconstruct(service_name);
    }

    CmdletName {
        verb,
        noun: format!(
            "{}{}{}",
            to_pascal_case(prefix),
            to_pascal_case(subject_prefix),
            pascal_case(&subject)
        ),
    }
}

/// One bound parameter of a command variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub serialized_name: String,
    pub location: ParameterLocation,
    pub type_declaration: EnhancedTypeDeclaration,
    pub required: bool,
    /// Positional slot, for required path parameters.
    pub position: Option<usize>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
}

/// One parameter set of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdletVariant {
    pub name: String,
    /// Source operation; `None` for model cmdlets.
    pub operation_id: Option<String>,
    pub class_name: String,
    pub parameters: Vec<ParameterDefinition>,
    pub output_type: Option<EnhancedTypeDeclaration>,
    pub description: Option<String>,
}

impl CmdletVariant {
    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A command and its parameter sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdletDefinition {
    pub name: String,
    pub verb: String,
    pub noun: String,
    pub variants: Vec<CmdletVariant>,
}

impl Definition for CmdletDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CmdletDefinition {
    pub fn new(name: &CmdletName) -> Self {
        Self {
            name: name.to_string(),
            verb: name.verb.clone(),
            noun: name.noun.clone(),
            variants: Vec::new(),
        }
    }

    /// Adds a variant, suffixing its name if another variant has it.
    pub fn add_variant(&mut self, mut variant: CmdletVariant) {
        let taken: HashSet<String> = self.variants.iter().map(|v| v.name.clone()).collect();
        let name = unique_name(&taken, &variant.name);
        if name != variant.name {
            warn!(cmdlet = %self.name, variant = %variant.name, name = %name, "variant name collision resolved by suffix");
            variant.class_name = format!("{}{}_{}", self.verb, self.noun, name);
            variant.name = name;
        }
        self.variants.push(variant);
    }

    pub fn variant(&self, name: &str) -> Option<&CmdletVariant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// First phase of [`CmdletNamespace`]: holds dependencies only.
///
/// Nothing is synthesized until [`initialize`](Self::initialize) runs, so no
/// other component ever sees a partially populated command set.
#[derive(Debug, Clone)]
pub struct CmdletNamespaceBuilder<'s> {
    service: &'s ServiceNamespace,
}

impl<'s> CmdletNamespaceBuilder<'s> {
    pub fn new(service: &'s ServiceNamespace) -> Self {
        Self { service }
    }

    /// Loads command-naming configuration, then synthesizes one command per
    /// verb-noun from the model's operations.
    ///
    /// Configuration and resolution failures are recorded on the context's
    /// checkpoint; lifecycle violations are returned.
    pub async fn initialize<C: ConfigSource>(
        self,
        config: &C,
        ctx: &mut SynthesisContext<'_>,
    ) -> Result<CmdletNamespace> {
        let mut loader = ConfigLoader::new(config, &mut *ctx.checkpoint);
        let prefix: String = loader.value_or("prefix", String::new()).await;
        let subject_prefix: String = loader.value_or("subject-prefix", String::new()).await;

        let mut commands: Namespace<CmdletDefinition> = Namespace::new(&self.service.child("Cmdlets"));
        let mut models: Namespace<ModelTypeDefinition> = Namespace::new(&self.service.child("Cmdlets.Models"));
        commands.begin()?;
        models.begin()?;
        ctx.registry.set_owner(models.full_name());

        let model = ctx.model;
        for operation in model.operations() {
            let name = cmdlet_name(
                &operation.operation_id,
                &prefix,
                &subject_prefix,
                self.service.service_name(),
            );
            let variant = synthesize_variant(operation, &name, ctx);
            debug!(cmdlet = %name, variant = %variant.name, "command synthesized");

            let key = name.to_string();
            match commands.get_mut(&key)? {
                Some(existing) => existing.add_variant(variant),
                None => {
                    let mut definition = CmdletDefinition::new(&name);
                    definition.add_variant(variant);
                    commands.insert(definition)?;
                }
            }
            materialize_pending(&mut models, ctx)?;
        }

        commands.finalize()?;
        models.finalize()?;
        Ok(CmdletNamespace {
            prefix,
            subject_prefix,
            commands,
            models,
        })
    }
}

fn synthesize_variant(operation: &Operation, name: &CmdletName, ctx: &mut SynthesisContext<'_>) -> CmdletVariant {
    let variant_name = {
        let pascal = to_pascal_case(&operation.operation_id);
        if pascal.is_empty() { "Default".to_string() } else { pascal }
    };

    let mut parameters = Vec::new();
    let mut taken = HashSet::new();
    let mut next_position = 0;
    for parameter in &operation.parameters {
        let decl = match ctx.resolver.resolve_type_declaration(
            ctx.model,
            parameter.schema,
            parameter.required,
            &mut ctx.registry,
        ) {
            Ok(decl) => decl,
            Err(e) => {
                ctx.checkpoint.record(e);
                continue;
            }
        };

        let candidate = {
            let pascal = to_pascal_case(&parameter.name);
            if pascal.is_empty() { "Parameter".to_string() } else { pascal }
        };
        let pascal_name = unique_name(&taken, &candidate);
        if pascal_name != candidate {
            warn!(operation = %operation.operation_id, parameter = %parameter.name, name = %pascal_name,
                "parameter name collision resolved by suffix");
        }
        taken.insert(pascal_name.clone());

        let position = (parameter.required && parameter.location == ParameterLocation::Path).then(|| {
            next_position += 1;
            next_position - 1
        });

        let mut aliases: Vec<String> = Vec::new();
        for alias in &parameter.aliases {
            if !alias.eq_ignore_ascii_case(&pascal_name) && !aliases.contains(alias) {
                aliases.push(alias.clone());
            }
        }
        if !parameter.name.eq_ignore_ascii_case(&pascal_name) && !aliases.contains(&parameter.name) {
            aliases.push(parameter.name.clone());
        }

        parameters.push(ParameterDefinition {
            name: pascal_name,
            serialized_name: parameter.name.clone(),
            location: parameter.location,
            type_declaration: decl,
            required: parameter.required,
            position,
            aliases,
            description: parameter.description.clone(),
        });
    }

    let output_type = operation.response.and_then(|response| {
        match ctx.resolver.resolve_type_declaration(ctx.model, response, true, &mut ctx.registry) {
            Ok(decl) => Some(decl),
            Err(e) => {
                ctx.checkpoint.record(e);
                None
            }
        }
    });

    CmdletVariant {
        class_name: format!("{}{}_{}", name.verb, name.noun, variant_name),
        name: variant_name,
        operation_id: Some(operation.operation_id.clone()),
        parameters,
        output_type,
        description: operation.description.clone(),
    }
}

/// `{ns}.Cmdlets`: one command per operation verb-noun, plus the inline types
/// first reached from operations (`{ns}.Cmdlets.Models`).
#[derive(Debug, Clone)]
pub struct CmdletNamespace {
    prefix: String,
    subject_prefix: String,
    commands: Namespace<CmdletDefinition>,
    models: Namespace<ModelTypeDefinition>,
}

impl CmdletNamespace {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn subject_prefix(&self) -> &str {
        &self.subject_prefix
    }

    pub fn commands(&self) -> &Namespace<CmdletDefinition> {
        &self.commands
    }

    /// Inline types owned by the command namespace.
    pub fn models(&self) -> &Namespace<ModelTypeDefinition> {
        &self.models
    }

    pub fn get(&self, name: &str) -> Option<&CmdletDefinition> {
        self.commands.get(name)
    }
}

#[cfg(test)]
mod tests {
    use cmdlet_synth_core::{ModelBuilder, Parameter, PrimitiveType, Schema, SchemaKind, SchemaModel};

    use super::*;
    use crate::config::YamlConfig;
    use crate::error::{Checkpoint, GenerationError};
    use crate::namespace::{ModelExtensionsNamespace, NamespaceState};
    use crate::resolver::{TypeOverride, TypeResolver};

    async fn synthesize(model: &SchemaModel, config: &YamlConfig, checkpoint: &mut Checkpoint) -> CmdletNamespace {
        let resolver = TypeResolver::new().with_override(TypeOverride::switch_parameter());
        let service = ServiceNamespace::new("Api", "Api");
        let mut ctx = SynthesisContext::new(model, &resolver, checkpoint);
        ModelExtensionsNamespace::new(&service, &mut ctx).unwrap();
        CmdletNamespaceBuilder::new(&service)
            .initialize(config, &mut ctx)
            .await
            .unwrap()
    }

    fn string(builder: &mut ModelBuilder, path: &str) -> cmdlet_synth_core::SchemaId {
        builder.add_schema(Schema::new(SchemaKind::Primitive(PrimitiveType::String), path))
    }

    #[test]
    fn test_group_action_ids() {
        assert_eq!(cmdlet_name("Widgets_List", "", "", "Api").to_string(), "List-Widgets");
        // remaining action words stay out of the noun
        assert_eq!(cmdlet_name("Widgets_CreateOrUpdate", "", "", "Api").to_string(), "Create-Widgets");
        assert_eq!(cmdlet_name("Widgets_ListByGroup", "Az", "", "Api").to_string(), "List-AzWidgets");
        assert_eq!(cmdlet_name("Widgets_", "", "", "Api").to_string(), "Widgets-Api");
        assert_eq!(cmdlet_name("", "", "", "Api").to_string(), "Invoke-Api");
    }

    #[tokio::test]
    async fn test_parameters_bind_positions_and_aliases() {
        let mut builder = ModelBuilder::new("Api", "1");
        let group = string(&mut builder, "operations/getWidget/parameters/resource_group");
        let id = string(&mut builder, "operations/getWidget/parameters/widgetId");
        let filter = string(&mut builder, "operations/getWidget/parameters/filter");
        let force = builder.add_schema(Schema::new(SchemaKind::Boolean, "operations/getWidget/parameters/force"));
        builder.add_operation(
            Operation::new("getWidget")
                .with_parameter(Parameter::new("resource_group", ParameterLocation::Path, group, true))
                .with_parameter(Parameter::new("widgetId", ParameterLocation::Path, id, true).with_alias("Name"))
                .with_parameter(Parameter::new("filter", ParameterLocation::Query, filter, false))
                .with_parameter(Parameter::new("force", ParameterLocation::Query, force, false)),
        );
        let model = builder.build();
        let mut checkpoint = Checkpoint::new();

        let cmdlets = synthesize(&model, &YamlConfig::new(), &mut checkpoint).await;
        let variant = cmdlets.get("Get-Widget").unwrap().variant("GetWidget").unwrap();

        let group = variant.parameter("ResourceGroup").unwrap();
        assert_eq!(group.position, Some(0));
        assert_eq!(group.aliases, vec!["resource_group"]);
        assert_eq!(group.serialized_name, "resource_group");

        let id = variant.parameter("WidgetId").unwrap();
        assert_eq!(id.position, Some(1));
        assert_eq!(id.aliases, vec!["Name"]);

        let filter = variant.parameter("Filter").unwrap();
        assert_eq!(filter.position, None);
        assert!(filter.aliases.is_empty());

        let force = variant.parameter("Force").unwrap();
        assert!(force.type_declaration.declaration.ends_with("SwitchParameter?"));
        assert_eq!(variant.class_name, "GetWidget_GetWidget");
        assert!(checkpoint.is_clean());
    }

    #[tokio::test]
    async fn test_same_name_operations_become_variants() {
        let mut builder = ModelBuilder::new("Api", "1");
        let color = string(&mut builder, "operations/listWidgetsByColor/parameters/color");
        builder.add_operation(Operation::new("Widgets_List"));
        builder.add_operation(
            Operation::new("Widgets_ListByColor").with_parameter(Parameter::new(
                "color",
                ParameterLocation::Query,
                color,
                true,
            )),
        );
        builder.add_operation(Operation::new("listWidgets"));
        let model = builder.build();
        let mut checkpoint = Checkpoint::new();

        let cmdlets = synthesize(&model, &YamlConfig::new(), &mut checkpoint).await;

        let list = cmdlets.get("List-Widgets").unwrap();
        let ids: Vec<_> = list.variants.iter().map(|v| v.operation_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("Widgets_List"), Some("Widgets_ListByColor"), Some("listWidgets")]);
        assert_eq!(list.variants[0].name, "WidgetsList");
        let by_color = list.variant("WidgetsListByColor").unwrap();
        assert!(by_color.parameter("Color").is_some());
        assert!(cmdlets.get("List-WidgetsByColor").is_none());
        assert_eq!(cmdlets.commands().len(), 1);
        assert_eq!(cmdlets.commands().state(), NamespaceState::Finalized);
    }

    #[tokio::test]
    async fn test_prefixes_come_from_configuration() {
        let mut builder = ModelBuilder::new("Api", "1");
        builder.add_operation(Operation::new("listWidgets"));
        let model = builder.build();
        let config = YamlConfig::new()
            .with_value("prefix", "Az")
            .with_value("subject-prefix", "Contoso");
        let mut checkpoint = Checkpoint::new();

        let cmdlets = synthesize(&model, &config, &mut checkpoint).await;

        assert_eq!(cmdlets.prefix(), "Az");
        let list = cmdlets.get("List-AzContosoWidgets").unwrap();
        assert_eq!(list.variants[0].class_name, "ListAzContosoWidgets_ListWidgets");
    }

    #[tokio::test]
    async fn test_inline_response_types_belong_to_cmdlets() {
        let mut builder = ModelBuilder::new("Api", "1");
        let total = builder.add_schema(Schema::new(
            SchemaKind::Primitive(PrimitiveType::Int64),
            "operations/countWidgets/response/properties/total",
        ));
        let response = builder.add_schema(
            Schema::new(SchemaKind::Object, "operations/countWidgets/response").with_property("total", total, true),
        );
        builder.add_operation(Operation::new("countWidgets").with_response(response));
        let model = builder.build();
        let mut checkpoint = Checkpoint::new();

        let cmdlets = synthesize(&model, &YamlConfig::new(), &mut checkpoint).await;
        let variant = &cmdlets.get("Count-Widgets").unwrap().variants[0];

        assert_eq!(
            variant.output_type.as_ref().unwrap().declaration,
            "Api.Cmdlets.Models.CountWidgetsResponse"
        );
        let model_type = cmdlets.models().get("CountWidgetsResponse").unwrap();
        assert_eq!(model_type.properties[0].type_declaration.declaration, "long");
    }

    #[tokio::test]
    async fn test_bad_prefix_is_recorded() {
        let mut builder = ModelBuilder::new("Api", "1");
        builder.add_operation(Operation::new("listWidgets"));
        let model = builder.build();
        let config = YamlConfig::from_yaml_str("prefix: [Az]\n").unwrap();
        let mut checkpoint = Checkpoint::new();

        let cmdlets = synthesize(&model, &config, &mut checkpoint).await;

        assert!(cmdlets.get("List-Widgets").is_some());
        assert!(matches!(
            checkpoint.errors(),
            [GenerationError::InvalidConfiguration { key, .. }] if key == "prefix"
        ));
    }
}
