//! Project assembly.
//!
//! [`ProjectAssembler`] is the two-phase entry point: [`ProjectAssembler::new`]
//! only stores the configuration source and schema model, and
//! [`ProjectAssembler::init`] loads configuration, builds the namespace tree in
//! dependency order, and runs the checkpoint. A [`Project`] only exists once
//! every namespace is finalized and no error was recorded.
//!
//! # Examples
//!
//! ```
//! use cmdlet_synth::{MemoryWriter, ProjectAssembler, YamlConfig};
//! use cmdlet_synth_core::SchemaModel;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let model = SchemaModel::from_yaml_str(r#"
//! info: { title: Contoso, version: "1.0" }
//! schemas:
//!   Widget:
//!     type: object
//!     properties:
//!       name: { type: string }
//! operations:
//!   - operationId: listWidgets
//!     response: { type: array, items: { $ref: Widget } }
//! "#).unwrap();
//! let config = YamlConfig::from_yaml_str(
//!     "module-name: Contoso\nmodule-version: 1.0.0\ndll-name: Contoso.dll\n",
//! ).unwrap();
//!
//! let project = ProjectAssembler::new(&config, &model).init().await.unwrap();
//! assert!(project.cmdlets.get("List-Widgets").is_some());
//!
//! let mut writer = MemoryWriter::new();
//! project.emit(&mut writer).unwrap();
//! assert!(writer.get("./Contoso.csproj").is_some());
//! # });
//! ```

use cmdlet_synth_core::naming::to_pascal_case;
use cmdlet_synth_core::{SchemaModel, validate_model};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigLoader, ConfigSource, Metadata};
use crate::descriptor::{CsprojDescriptor, DescriptorFormat};
use crate::error::{Checkpoint, CheckpointError, GenerationError};
use crate::namespace::{
    CmdletDefinition, CmdletNamespace, CmdletNamespaceBuilder, ModelCmdletNamespace, ModelExtensionsNamespace,
    ModelTypeDefinition, Namespace, ServiceNamespace, SupportNamespace, SupportTypeDefinition, SynthesisContext,
};
use crate::overrides::OverrideTable;
use crate::resolver::{TypeOverride, TypeResolver};
use crate::writer::{ContentType, WriteError, Writer};

/// Minimum Az.Accounts version generated modules depend on.
pub const ACCOUNTS_VERSION_MINIMUM: &str = "1.6.0";

/// Output folders of the generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folders {
    pub base: String,
    pub module: String,
    pub cmdlet: String,
    pub model_cmdlet: String,
    pub custom: String,
    pub internal: String,
    pub test: String,
    pub runtime: String,
    pub api: String,
    pub bin: String,
    pub obj: String,
    pub exports: String,
    pub docs: String,
    pub dependency_module: String,
    pub examples: String,
    pub resources: String,
}

impl Folders {
    /// Default layout under `base` (the current folder) and `module`.
    pub fn derive(base: &str, module: &str) -> Self {
        Self {
            base: base.to_string(),
            module: module.to_string(),
            cmdlet: format!("{module}/cmdlets"),
            model_cmdlet: format!("{module}/model-cmdlets"),
            custom: format!("{base}/custom"),
            internal: format!("{base}/internal"),
            test: format!("{base}/test"),
            runtime: format!("{module}/runtime"),
            api: format!("{module}/api"),
            bin: format!("{base}/bin"),
            obj: format!("{base}/obj"),
            exports: format!("{base}/exports"),
            docs: format!("{base}/docs"),
            dependency_module: format!("{module}/modules"),
            examples: format!("{base}/examples"),
            resources: format!("{base}/resources"),
        }
    }
}

/// Well-known file paths of the generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFiles {
    pub csproj: String,
    pub dll: String,
    pub psd1: String,
    pub psm1: String,
    pub psm1_custom: String,
    pub psm1_internal: String,
    pub format_ps1xml: String,
    pub nuspec: String,
    pub git_ignore: String,
    pub git_attributes: String,
    pub readme: String,
}

impl ProjectFiles {
    pub fn derive(folders: &Folders, module_name: &str, dll_name: &str) -> Self {
        let base = &folders.base;
        Self {
            csproj: format!("{base}/{module_name}.csproj"),
            dll: format!("{}/{dll_name}", folders.bin),
            psd1: format!("{base}/{module_name}.psd1"),
            psm1: format!("{base}/{module_name}.psm1"),
            psm1_custom: format!("{}/{module_name}.custom.psm1", folders.custom),
            psm1_internal: format!("{}/{module_name}.internal.psm1", folders.internal),
            format_ps1xml: format!("{base}/{module_name}.format.ps1xml"),
            nuspec: format!("{base}/{module_name}.nuspec"),
            git_ignore: format!("{base}/.gitignore"),
            git_attributes: format!("{base}/.gitattributes"),
            readme: format!("{base}/readme.md"),
        }
    }
}

/// Names, paths, flags, and metadata of one generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub module_name: String,
    pub module_version: String,
    pub dll_name: String,
    pub project_namespace: String,
    pub service_name: String,
    pub help_link_prefix: String,
    pub azure: bool,
    pub skip_model_cmdlets: bool,
    pub profiles: Vec<String>,
    pub accounts_version_minimum: String,
    pub folders: Folders,
    pub files: ProjectFiles,
    pub metadata: Metadata,
}

impl ProjectSettings {
    /// Settings with every optional value at its default.
    pub fn with_defaults(module_name: &str, module_version: &str, dll_name: &str, project_namespace: &str) -> Self {
        let folders = Folders::derive(".", "./generated");
        let files = ProjectFiles::derive(&folders, module_name, dll_name);
        Self {
            module_name: module_name.to_string(),
            module_version: module_version.to_string(),
            dll_name: dll_name.to_string(),
            project_namespace: project_namespace.to_string(),
            service_name: to_pascal_case(module_name),
            help_link_prefix: String::new(),
            azure: false,
            skip_model_cmdlets: true,
            profiles: Vec::new(),
            accounts_version_minimum: ACCOUNTS_VERSION_MINIMUM.to_string(),
            folders,
            files,
            metadata: Metadata::default(),
        }
    }

    /// Loads every setting from `config`.
    ///
    /// Each key is read independently; failures are recorded on `checkpoint`
    /// and the affected value falls back to a neutral default so the rest of
    /// the load still runs.
    pub async fn load<C: ConfigSource>(config: &C, model: &SchemaModel, checkpoint: &mut Checkpoint) -> Self {
        let mut loader = ConfigLoader::new(config, checkpoint);

        let module_version: String = loader.required("module-version").await;
        let help_link_prefix = loader.value_or("help-link-prefix", String::new()).await;
        let profiles = loader.value_or("profiles", Vec::<String>::new()).await;
        let skip_model_cmdlets = loader.value_or("skip-model-cmdlets", true).await;
        let azure = loader.value_or("azure", false).await;

        let module_name: String = loader.required("module-name").await;
        let dll_name: String = loader.required("dll-name").await;
        let project_namespace = loader.value_or("namespace", module_name.clone()).await;
        let default_service = match to_pascal_case(&model.info().title) {
            title if title.is_empty() => module_name.clone(),
            title => title,
        };
        let service_name = loader.value_or("service-name", default_service).await;

        let base = loader.value_or("current-folder", ".".to_string()).await;
        let module = loader.value_or("module-folder", format!("{base}/generated")).await;
        let d = Folders::derive(&base, &module);
        let folders = Folders {
            cmdlet: loader.value_or("cmdlet-folder", d.cmdlet).await,
            model_cmdlet: loader.value_or("model-cmdlet-folder", d.model_cmdlet).await,
            custom: loader.value_or("custom-cmdlet-folder", d.custom).await,
            internal: loader.value_or("internal-cmdlet-folder", d.internal).await,
            test: loader.value_or("test-folder", d.test).await,
            runtime: loader.value_or("runtime-folder", d.runtime).await,
            api: loader.value_or("api-folder", d.api).await,
            bin: loader.value_or("bin-folder", d.bin).await,
            obj: loader.value_or("obj-folder", d.obj).await,
            exports: loader.value_or("exports-folder", d.exports).await,
            docs: loader.value_or("docs-folder", d.docs).await,
            dependency_module: loader.value_or("dependency-module-folder", d.dependency_module).await,
            examples: loader.value_or("examples-folder", d.examples).await,
            resources: loader.value_or("resources-folder", d.resources).await,
            base,
            module,
        };

        let f = ProjectFiles::derive(&folders, &module_name, &dll_name);
        let files = ProjectFiles {
            csproj: loader.value_or("csproj", f.csproj).await,
            dll: loader.value_or("dll", f.dll).await,
            psd1: loader.value_or("psd1", f.psd1).await,
            psm1: loader.value_or("psm1", f.psm1).await,
            psm1_custom: loader.value_or("psm1-custom", f.psm1_custom).await,
            psm1_internal: loader.value_or("psm1-internal", f.psm1_internal).await,
            format_ps1xml: loader.value_or("format-ps1xml", f.format_ps1xml).await,
            nuspec: loader.value_or("nuspec", f.nuspec).await,
            git_ignore: f.git_ignore,
            git_attributes: f.git_attributes,
            readme: f.readme,
        };

        let metadata = loader.value_or("metadata", Metadata::default()).await;
        debug!(module = %module_name, namespace = %project_namespace, "project settings loaded");

        Self {
            module_name,
            module_version,
            dll_name,
            project_namespace,
            service_name,
            help_link_prefix,
            azure,
            skip_model_cmdlets,
            profiles,
            accounts_version_minimum: ACCOUNTS_VERSION_MINIMUM.to_string(),
            folders,
            files,
            metadata,
        }
    }

    /// `dll-name` without a trailing `.dll`.
    pub fn assembly_name(&self) -> &str {
        self.dll_name.strip_suffix(".dll").unwrap_or(&self.dll_name)
    }
}

/// A fully assembled project: settings plus the finalized namespace tree.
#[derive(Debug)]
pub struct Project {
    pub settings: ProjectSettings,
    pub overrides: OverrideTable,
    pub service: ServiceNamespace,
    pub support: SupportNamespace,
    pub model_cmdlets: ModelCmdletNamespace,
    pub models: ModelExtensionsNamespace,
    pub cmdlets: CmdletNamespace,
    descriptor: Box<dyn DescriptorFormat>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocument<'p> {
    settings: &'p ProjectSettings,
    service: &'p ServiceNamespace,
    support: &'p Namespace<SupportTypeDefinition>,
    models: &'p Namespace<ModelTypeDefinition>,
    cmdlets: &'p Namespace<CmdletDefinition>,
    cmdlet_models: &'p Namespace<ModelTypeDefinition>,
    model_cmdlets: &'p Namespace<CmdletDefinition>,
}

impl Project {
    /// Path of the JSON project model.
    pub fn model_path(&self) -> String {
        format!("{}/{}.model.json", self.settings.folders.module, self.settings.module_name)
    }

    /// The namespace tree as pretty-printed JSON, before overrides.
    pub fn model_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ProjectDocument {
            settings: &self.settings,
            service: &self.service,
            support: self.support.namespace(),
            models: self.models.namespace(),
            cmdlets: self.cmdlets.commands(),
            cmdlet_models: self.cmdlets.models(),
            model_cmdlets: self.model_cmdlets.namespace(),
        })
    }

    /// Stages the project descriptor and the project model, with overrides
    /// applied to both.
    ///
    /// Both texts are rendered and their paths checked before anything is
    /// written, so a failure there leaves the writer untouched.
    pub fn emit<W: Writer + ?Sized>(&self, writer: &mut W) -> Result<(), WriteError> {
        let descriptor_path = self.descriptor.path(&self.settings);
        let descriptor = self.overrides.apply(&self.descriptor.render(&self.settings));
        let model_path = self.model_path();
        let document = self.overrides.apply(&self.model_document()?);
        if descriptor_path == model_path {
            return Err(WriteError::DuplicatePath(model_path));
        }

        writer.write_file(&descriptor_path, &descriptor, None, self.descriptor.content_type())?;
        writer.write_file(&model_path, &document, None, ContentType::SourceFileJson)?;

        info!(descriptor = %descriptor_path, model = %model_path, "project emitted");
        Ok(())
    }
}

/// Builds a [`Project`] from configuration and a schema model.
pub struct ProjectAssembler<'a, C> {
    config: &'a C,
    model: &'a SchemaModel,
    descriptor: Box<dyn DescriptorFormat>,
    type_overrides: Vec<TypeOverride>,
}

impl<'a, C: ConfigSource> ProjectAssembler<'a, C> {
    /// Stores the inputs. Nothing is read until [`init`](Self::init).
    pub fn new(config: &'a C, model: &'a SchemaModel) -> Self {
        Self {
            config,
            model,
            descriptor: Box::new(CsprojDescriptor),
            type_overrides: Vec::new(),
        }
    }

    /// Replaces the project descriptor format.
    pub fn with_descriptor(mut self, descriptor: impl DescriptorFormat + 'static) -> Self {
        self.descriptor = Box::new(descriptor);
        self
    }

    /// Registers a type override checked after the built-in switch override.
    pub fn with_type_override(mut self, type_override: TypeOverride) -> Self {
        self.type_overrides.push(type_override);
        self
    }

    /// Runs the whole assembly.
    ///
    /// # Errors
    ///
    /// A [`CheckpointError`] listing every recorded problem. Lifecycle
    /// violations stop assembly at once and are reported the same way.
    pub async fn init(self) -> Result<Project, CheckpointError> {
        let mut checkpoint = Checkpoint::new();
        match self.assemble(&mut checkpoint).await {
            Ok(project) => {
                checkpoint.check()?;
                info!(
                    module = %project.settings.module_name,
                    models = project.models.namespace().len(),
                    cmdlets = project.cmdlets.commands().len(),
                    "project assembled"
                );
                Ok(project)
            }
            Err(fatal) => {
                checkpoint.record(fatal);
                Err(checkpoint.abort())
            }
        }
    }

    async fn assemble(self, checkpoint: &mut Checkpoint) -> Result<Project, GenerationError> {
        info!(api = %self.model.info().title, "assembling project");
        for issue in validate_model(self.model) {
            checkpoint.record(issue.into());
        }

        let settings = ProjectSettings::load(self.config, self.model, checkpoint).await;

        let mut resolver = TypeResolver::new().with_override(TypeOverride::switch_parameter());
        for type_override in self.type_overrides {
            resolver.register_override(type_override);
        }
        let overrides = OverrideTable::legacy_runtime(&settings.project_namespace);

        let service = ServiceNamespace::new(&settings.project_namespace, &settings.service_name);
        let support = SupportNamespace::new(&service, &resolver)?;
        let mut model_cmdlets = ModelCmdletNamespace::new(&service);

        let mut ctx = SynthesisContext::new(self.model, &resolver, checkpoint);
        let models = ModelExtensionsNamespace::new(&service, &mut ctx)?;
        let cmdlets = CmdletNamespaceBuilder::new(&service)
            .initialize(self.config, &mut ctx)
            .await?;

        if settings.skip_model_cmdlets {
            model_cmdlets.skip()?;
        } else {
            model_cmdlets.materialize(&models, &cmdlets)?;
        }

        Ok(Project {
            settings,
            overrides,
            service,
            support,
            model_cmdlets,
            models,
            cmdlets,
            descriptor: self.descriptor,
        })
    }
}
