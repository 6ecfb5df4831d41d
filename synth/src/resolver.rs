//! Schema to target-type resolution.
//!
//! [`TypeResolver::resolve_type_declaration`] maps a schema node plus a
//! `required` flag to an [`EnhancedTypeDeclaration`]. Registered
//! [`TypeOverride`]s are consulted first, in registration order; the first
//! whose predicate accepts the schema produces the declaration. Everything
//! else goes through the default kind mapping.
//!
//! Enum, object, and union schemas name generated types. The first resolution
//! of such a schema registers it with the [`TypeRegistry`] under the namespace
//! currently visiting and queues it for materialization; later resolutions of
//! the same [`SchemaId`] return the same name. Materialization (and with it
//! the resolution of a type's own properties) happens when the owning
//! namespace drains the queue, so self-referential graphs terminate.
//!
//! # Examples
//!
//! ```
//! use cmdlet_synth::{TypeOverride, TypeRegistry, TypeResolver};
//! use cmdlet_synth_core::{ModelBuilder, PrimitiveType, Schema, SchemaKind};
//!
//! let mut builder = ModelBuilder::new("Contoso", "1.0");
//! let count = builder.add_schema(Schema::new(SchemaKind::Primitive(PrimitiveType::Int32), "count"));
//! let force = builder.add_schema(Schema::new(SchemaKind::Boolean, "force"));
//! let model = builder.build();
//!
//! let resolver = TypeResolver::new().with_override(TypeOverride::switch_parameter());
//! let mut registry = TypeRegistry::new("Contoso.Models");
//!
//! let optional = resolver.resolve_type_declaration(&model, count, false, &mut registry).unwrap();
//! assert_eq!(optional.declaration, "int?");
//! assert!(optional.is_nullable);
//!
//! let switch = resolver.resolve_type_declaration(&model, force, true, &mut registry).unwrap();
//! assert_eq!(switch.declaration, "global::System.Management.Automation.SwitchParameter");
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use cmdlet_synth_core::naming::{deconstruct, pascal_case, to_pascal_case, unique_name};
use cmdlet_synth_core::{PrimitiveType, Schema, SchemaId, SchemaKind, SchemaModel};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GenerationError, Result};

/// Runtime type the built-in boolean override maps to.
pub const SWITCH_PARAMETER: &str = "global::System.Management.Automation.SwitchParameter";

const DICTIONARY: &str = "global::System.Collections.Generic.IDictionary";

/// Path segments that describe document structure rather than naming a type.
const STRUCTURAL_SEGMENTS: &[&str] = &[
    "schemas",
    "properties",
    "operations",
    "parameters",
    "items",
    "additionalProperties",
    "oneOf",
];

/// Serialization hint attached to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Dictionary,
    Binary,
}

/// Identity of a generated type: the schema it came from and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GeneratedTypeRef {
    pub schema: SchemaId,
    pub namespace: String,
    pub name: String,
}

impl GeneratedTypeRef {
    /// `{namespace}.{name}`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Resolved target type for one (schema, required) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancedTypeDeclaration {
    /// Type signature as it appears in generated source.
    pub declaration: String,
    pub is_required: bool,
    /// Whether the declaration admits `null`.
    pub is_nullable: bool,
    /// Expression used when no value is supplied.
    pub default_value: String,
    pub json_type: JsonType,
    /// Set for enum, object, and union declarations.
    pub generated: Option<GeneratedTypeRef>,
}

impl EnhancedTypeDeclaration {
    /// A value-kind declaration; optional values get a nullable wrapper.
    pub fn value(
        base: &str,
        required: bool,
        json_type: JsonType,
        default: Option<String>,
        generated: Option<GeneratedTypeRef>,
    ) -> Self {
        let declaration = if required {
            base.to_string()
        } else {
            format!("{base}?")
        };
        let default_value = default.unwrap_or_else(|| {
            if required {
                format!("default({base})")
            } else {
                "null".to_string()
            }
        });
        Self {
            declaration,
            is_required: required,
            is_nullable: !required,
            default_value,
            json_type,
            generated,
        }
    }

    /// A reference-kind declaration, nullable regardless of `required`.
    pub fn reference(
        base: &str,
        required: bool,
        json_type: JsonType,
        default: Option<String>,
        generated: Option<GeneratedTypeRef>,
    ) -> Self {
        Self {
            declaration: base.to_string(),
            is_required: required,
            is_nullable: true,
            default_value: default.unwrap_or_else(|| "null".to_string()),
            json_type,
            generated,
        }
    }
}

type Predicate = Box<dyn Fn(&Schema) -> bool + Send + Sync>;
type Handler = Box<dyn Fn(&Schema, bool) -> EnhancedTypeDeclaration + Send + Sync>;

/// Runtime-support type an override introduces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportType {
    pub name: String,
    pub declaration: String,
    /// Schema kind the support type stands in for.
    pub replaces: String,
}

/// A predicate plus handler checked before the default mapping.
pub struct TypeOverride {
    name: String,
    support: Option<SupportType>,
    matches: Predicate,
    declare: Handler,
}

impl TypeOverride {
    pub fn new(
        name: &str,
        matches: impl Fn(&Schema) -> bool + Send + Sync + 'static,
        declare: impl Fn(&Schema, bool) -> EnhancedTypeDeclaration + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            support: None,
            matches: Box::new(matches),
            declare: Box::new(declare),
        }
    }

    /// Declares the runtime-support type this override relies on.
    pub fn with_support(mut self, support: SupportType) -> Self {
        self.support = Some(support);
        self
    }

    /// Boolean schemas become toggle-style switch parameters.
    pub fn switch_parameter() -> Self {
        Self::new(
            "switch-parameter",
            |schema| schema.kind() == &SchemaKind::Boolean,
            |schema, required| {
                EnhancedTypeDeclaration::value(
                    SWITCH_PARAMETER,
                    required,
                    JsonType::Boolean,
                    schema.default.as_ref().and_then(bool_literal),
                    None,
                )
            },
        )
        .with_support(SupportType {
            name: "SwitchParameter".to_string(),
            declaration: SWITCH_PARAMETER.to_string(),
            replaces: SchemaKind::Boolean.label().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn support(&self) -> Option<&SupportType> {
        self.support.as_ref()
    }

    pub fn matches(&self, schema: &Schema) -> bool {
        (self.matches)(schema)
    }
}

impl fmt::Debug for TypeOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOverride")
            .field("name", &self.name)
            .field("support", &self.support)
            .finish_non_exhaustive()
    }
}

fn bool_literal(value: &Value) -> Option<String> {
    value.as_bool().map(|b| b.to_string())
}

/// Generated-type bookkeeping for one generation run.
///
/// Maps schema identity to generated names, keeps names unique per namespace,
/// and queues newly registered types for materialization in first-seen order.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_schema: HashMap<SchemaId, GeneratedTypeRef>,
    taken: HashMap<String, HashSet<String>>,
    pending: VecDeque<SchemaId>,
    owner: String,
}

impl TypeRegistry {
    /// Creates a registry whose new types land in `owner`.
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            ..Default::default()
        }
    }

    /// Namespace that owns types registered from now on.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn set_owner(&mut self, namespace: &str) {
        debug!(namespace, "type ownership moved");
        self.owner = namespace.to_string();
    }

    /// Generated type for `schema`, if already registered.
    pub fn lookup(&self, schema: SchemaId) -> Option<&GeneratedTypeRef> {
        self.by_schema.get(&schema)
    }

    /// Next type waiting to be materialized.
    pub fn next_pending(&mut self) -> Option<SchemaId> {
        self.pending.pop_front()
    }

    /// Number of registered generated types.
    pub fn len(&self) -> usize {
        self.by_schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_schema.is_empty()
    }

    /// Returns the existing registration for `id` or registers a new one.
    pub fn register(&mut self, model: &SchemaModel, id: SchemaId) -> GeneratedTypeRef {
        if let Some(existing) = self.by_schema.get(&id) {
            return existing.clone();
        }

        let schema = model.schema(id);
        let candidate = type_name_candidate(schema);
        let taken = self.taken.entry(self.owner.clone()).or_default();
        let name = unique_name(taken, &candidate);
        if name != candidate {
            warn!(
                path = %schema.path,
                candidate = %candidate,
                name = %name,
                "generated type name collision resolved by suffix"
            );
        }
        taken.insert(name.clone());

        let generated = GeneratedTypeRef {
            schema: id,
            namespace: self.owner.clone(),
            name,
        };
        debug!(path = %schema.path, r#type = %generated.full_name(), "generated type registered");
        self.by_schema.insert(id, generated.clone());
        self.pending.push_back(id);
        generated
    }
}

/// Declared name when there is one, else a name synthesized from the path.
fn type_name_candidate(schema: &Schema) -> String {
    let declared = schema.name.as_deref().map(to_pascal_case).unwrap_or_default();
    if !declared.is_empty() {
        return declared;
    }

    let words: Vec<String> = schema
        .path
        .split('/')
        .filter(|segment| !STRUCTURAL_SEGMENTS.contains(segment))
        .flat_map(deconstruct)
        .collect();
    let synthesized = pascal_case(&words);
    if synthesized.is_empty() {
        "AnonymousType".to_string()
    } else {
        synthesized
    }
}

/// Resolves schemas to target declarations.
#[derive(Debug, Default)]
pub struct TypeResolver {
    overrides: Vec<TypeOverride>,
}

impl TypeResolver {
    /// A resolver with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an override; earlier registrations win.
    pub fn with_override(mut self, type_override: TypeOverride) -> Self {
        self.register_override(type_override);
        self
    }

    pub fn register_override(&mut self, type_override: TypeOverride) {
        debug!(name = %type_override.name, "type override registered");
        self.overrides.push(type_override);
    }

    /// Registered overrides in precedence order.
    pub fn overrides(&self) -> &[TypeOverride] {
        &self.overrides
    }

    /// Resolves `id` for the given `required` flag.
    ///
    /// # Errors
    ///
    /// [`GenerationError::UnsupportedSchemaKind`] for unsupported kinds, unions
    /// without a discriminator, arrays or maps without an element schema, and
    /// arrays or maps that contain themselves with no generated type between.
    pub fn resolve_type_declaration(
        &self,
        model: &SchemaModel,
        id: SchemaId,
        required: bool,
        registry: &mut TypeRegistry,
    ) -> Result<EnhancedTypeDeclaration> {
        self.resolve(model, id, required, registry, &mut HashSet::new())
    }

    /// `collections` holds the array and map nodes currently being unwrapped.
    fn resolve(
        &self,
        model: &SchemaModel,
        id: SchemaId,
        required: bool,
        registry: &mut TypeRegistry,
        collections: &mut HashSet<SchemaId>,
    ) -> Result<EnhancedTypeDeclaration> {
        let schema = model.schema(id);
        if let Some(found) = self.overrides.iter().find(|o| o.matches(schema)) {
            return Ok((found.declare)(schema, required));
        }

        match schema.kind() {
            SchemaKind::Primitive(primitive) => {
                let (base, json_type) = primitive_declaration(*primitive);
                let default = schema.default.as_ref().and_then(literal);
                if primitive.is_value_type() {
                    Ok(EnhancedTypeDeclaration::value(base, required, json_type, default, None))
                } else {
                    Ok(EnhancedTypeDeclaration::reference(base, required, json_type, default, None))
                }
            }
            SchemaKind::Boolean => Ok(EnhancedTypeDeclaration::value(
                "bool",
                required,
                JsonType::Boolean,
                schema.default.as_ref().and_then(bool_literal),
                None,
            )),
            SchemaKind::Enum => {
                let generated = registry.register(model, id);
                let full_name = generated.full_name();
                let default = schema
                    .default
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(|member| format!("{full_name}.{}", to_pascal_case(member)));
                Ok(EnhancedTypeDeclaration::value(
                    &full_name,
                    required,
                    JsonType::String,
                    default,
                    Some(generated),
                ))
            }
            SchemaKind::Object => {
                let generated = registry.register(model, id);
                Ok(EnhancedTypeDeclaration::reference(
                    &generated.full_name(),
                    required,
                    JsonType::Object,
                    None,
                    Some(generated),
                ))
            }
            SchemaKind::Union => {
                if schema.discriminator.is_none() {
                    return Err(unsupported(schema, "polymorphic-union without discriminator"));
                }
                let generated = registry.register(model, id);
                Ok(EnhancedTypeDeclaration::reference(
                    &generated.full_name(),
                    required,
                    JsonType::Object,
                    None,
                    Some(generated),
                ))
            }
            SchemaKind::Array => {
                let items = schema.items.ok_or_else(|| unsupported(schema, "array without items"))?;
                let element = self.resolve_element(model, id, items, registry, collections)?;
                Ok(EnhancedTypeDeclaration::reference(
                    &format!("{}[]", element.declaration),
                    required,
                    JsonType::Array,
                    None,
                    None,
                ))
            }
            SchemaKind::Map => {
                let items = schema.items.ok_or_else(|| unsupported(schema, "map without items"))?;
                let element = self.resolve_element(model, id, items, registry, collections)?;
                Ok(EnhancedTypeDeclaration::reference(
                    &format!("{DICTIONARY}<string, {}>", element.declaration),
                    required,
                    JsonType::Dictionary,
                    None,
                    None,
                ))
            }
            SchemaKind::Unsupported(kind) => Err(unsupported(schema, kind)),
        }
    }

    /// Resolves the element of collection `id`, failing if `id` is already
    /// being unwrapped further up.
    fn resolve_element(
        &self,
        model: &SchemaModel,
        id: SchemaId,
        items: SchemaId,
        registry: &mut TypeRegistry,
        collections: &mut HashSet<SchemaId>,
    ) -> Result<EnhancedTypeDeclaration> {
        if !collections.insert(id) {
            return Err(unsupported(model.schema(id), "recursive collection"));
        }
        let element = self.resolve(model, items, true, registry, collections);
        collections.remove(&id);
        element
    }
}

fn unsupported(schema: &Schema, kind: &str) -> GenerationError {
    GenerationError::UnsupportedSchemaKind {
        path: schema.path.clone(),
        kind: kind.to_string(),
    }
}

fn primitive_declaration(primitive: PrimitiveType) -> (&'static str, JsonType) {
    match primitive {
        PrimitiveType::String | PrimitiveType::Uuid => ("string", JsonType::String),
        PrimitiveType::Int32 => ("int", JsonType::Number),
        PrimitiveType::Int64 => ("long", JsonType::Number),
        PrimitiveType::Number => ("double", JsonType::Number),
        PrimitiveType::Float => ("float", JsonType::Number),
        PrimitiveType::DateTime | PrimitiveType::Date => ("global::System.DateTime", JsonType::String),
        PrimitiveType::Duration => ("global::System.TimeSpan", JsonType::String),
        PrimitiveType::ByteArray => ("byte[]", JsonType::String),
        PrimitiveType::Binary => ("global::System.IO.Stream", JsonType::Binary),
    }
}

/// Renders a document default as a source literal.
fn literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(quote(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
