//! Schema model type definitions.
//!
//! A [`SchemaModel`] is an arena of [`Schema`] nodes addressed by
//! [`SchemaId`]. Nodes reference each other by id, which lets the graph share
//! sub-schemas and contain cycles without reference counting. Identity is the
//! id, never structural equality: two nodes with identical shapes are still two
//! distinct types.
//!
//! Models are assembled with a [`ModelBuilder`] (or decoded from an API
//! description, see [`SchemaModel::from_yaml_str`]) and are read-only once
//! built.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable identity of a schema node within one [`SchemaModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Position of the node in the model arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Wire format of a primitive schema.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::PrimitiveType;
///
/// assert_eq!(PrimitiveType::default(), PrimitiveType::String);
/// assert!(PrimitiveType::Int64.is_value_type());
/// assert!(!PrimitiveType::String.is_value_type());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PrimitiveType {
    /// Free-form text (the default).
    #[default]
    String,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// Double precision number.
    Number,
    /// Single precision number.
    Float,
    /// Timestamp (`date-time`).
    DateTime,
    /// Calendar date (`date`).
    Date,
    /// ISO-8601 duration.
    Duration,
    /// UUID rendered as text.
    Uuid,
    /// Base64 encoded bytes (`byte`).
    ByteArray,
    /// Raw binary stream (`binary`).
    Binary,
}

impl PrimitiveType {
    /// Returns `true` when the generated representation is a value type, which
    /// needs an explicit nullable wrapper when optional.
    pub fn is_value_type(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Number | Self::Float | Self::DateTime | Self::Date | Self::Duration
        )
    }
}

/// Shape of a schema node. Fixed when the node is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    /// Object with named properties.
    Object,
    /// Closed set of string values.
    Enum,
    /// Scalar value.
    Primitive(PrimitiveType),
    /// `true` / `false`.
    Boolean,
    /// Ordered collection of `items`.
    Array,
    /// String-keyed dictionary of `items`.
    Map,
    /// Polymorphic union over `variants`, told apart by a discriminator.
    Union,
    /// A shape the description declared but nothing downstream can map.
    Unsupported(String),
}

impl SchemaKind {
    /// Short label used in diagnostics.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdlet_synth_core::{PrimitiveType, SchemaKind};
    ///
    /// assert_eq!(SchemaKind::Object.label(), "object");
    /// assert_eq!(SchemaKind::Primitive(PrimitiveType::Int32).label(), "primitive");
    /// assert_eq!(SchemaKind::Unsupported("file".into()).label(), "file");
    /// ```
    pub fn label(&self) -> &str {
        match self {
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Primitive(_) => "primitive",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Map => "map",
            Self::Union => "polymorphic-union",
            Self::Unsupported(other) => other,
        }
    }
}

/// Named property of an object schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Wire name as written in the description.
    pub name: String,
    /// Schema of the property value.
    pub schema: SchemaId,
}

/// One node of the API type graph.
///
/// The `kind` is private so it cannot change after construction; every other
/// attribute is plain data filled in while the model is being built.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::{ModelBuilder, PrimitiveType, Schema, SchemaKind};
///
/// let mut builder = ModelBuilder::new("Contoso", "1.0");
/// let name = builder.add_schema(Schema::new(
///     SchemaKind::Primitive(PrimitiveType::String),
///     "schemas/Widget/properties/name",
/// ));
/// let widget = builder.declare(
///     "Widget",
///     Schema::new(SchemaKind::Object, "schemas/Widget").with_property("name", name, true),
/// );
/// let model = builder.build();
///
/// let schema = model.schema(widget);
/// assert_eq!(schema.kind(), &SchemaKind::Object);
/// assert!(schema.is_required("name"));
/// assert_eq!(schema.name.as_deref(), Some("Widget"));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    /// Declared name (schema table key or `title`), if any.
    pub name: Option<String>,
    /// Location in the description, used for diagnostics and naming.
    pub path: String,
    /// Human description.
    pub description: Option<String>,
    /// Object properties in declaration order.
    pub properties: Vec<Property>,
    /// Names of required properties.
    pub required: Vec<String>,
    /// Element schema for arrays and maps.
    pub items: Option<SchemaId>,
    /// Allowed values for enums.
    pub enum_values: Vec<String>,
    /// Member schemas of a union.
    pub variants: Vec<SchemaId>,
    /// Property that tells union members apart.
    pub discriminator: Option<String>,
    /// Default value from the description.
    pub default: Option<serde_json::Value>,
}

impl Schema {
    /// Creates a schema of the given kind located at `path`.
    pub fn new(kind: SchemaKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            name: None,
            path: path.into(),
            description: None,
            properties: Vec::new(),
            required: Vec::new(),
            items: None,
            enum_values: Vec::new(),
            variants: Vec::new(),
            discriminator: None,
            default: None,
        }
    }

    /// The immutable shape of this node.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Adds a property, optionally marking it required.
    pub fn with_property(mut self, name: &str, schema: SchemaId, required: bool) -> Self {
        self.properties.push(Property {
            name: name.to_string(),
            schema,
        });
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Sets the element schema (arrays and maps).
    pub fn with_items(mut self, items: SchemaId) -> Self {
        self.items = Some(items);
        self
    }

    /// Sets the allowed enum values.
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets union members and the discriminating property.
    pub fn with_variants(mut self, variants: Vec<SchemaId>, discriminator: Option<&str>) -> Self {
        self.variants = variants;
        self.discriminator = discriminator.map(String::from);
        self
    }

    /// Sets the declared name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Returns `true` if `property` is listed as required.
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// Where an operation parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    #[default]
    Query,
    Header,
    Body,
}

/// Input of an API operation.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Wire name.
    pub name: String,
    /// Transport location.
    pub location: ParameterLocation,
    /// Whether callers must supply it.
    pub required: bool,
    /// Extra names callers may use.
    pub aliases: Vec<String>,
    /// Value schema.
    pub schema: SchemaId,
    /// Human description.
    pub description: Option<String>,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: &str, location: ParameterLocation, schema: SchemaId, required: bool) -> Self {
        Self {
            name: name.to_string(),
            location,
            required,
            aliases: Vec::new(),
            schema,
            description: None,
        }
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// One invocable API operation.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Unique operation identifier (e.g. `listWidgets`).
    pub operation_id: String,
    /// Human description.
    pub description: Option<String>,
    /// Inputs in declaration order.
    pub parameters: Vec<Parameter>,
    /// Success response body schema.
    pub response: Option<SchemaId>,
}

impl Operation {
    /// Creates an operation with no parameters and no response body.
    pub fn new(operation_id: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            description: None,
            parameters: Vec::new(),
            response: None,
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the response schema.
    pub fn with_response(mut self, schema: SchemaId) -> Self {
        self.response = Some(schema);
        self
    }
}

/// Title and version of the described API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

/// Read-only API type graph plus its operations.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    info: ApiInfo,
    schemas: Vec<Schema>,
    table: Vec<(String, SchemaId)>,
    index: HashMap<String, SchemaId>,
    operations: Vec<Operation>,
}

impl SchemaModel {
    /// API title and version.
    pub fn info(&self) -> &ApiInfo {
        &self.info
    }

    /// Returns the node for `id`.
    ///
    /// Ids are only minted by the builder of this model, so lookups by an id
    /// from another model are a caller bug.
    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.schemas[id.0]
    }

    /// Returns the node for `id`, or `None` if the id is out of range.
    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0)
    }

    /// Every node, named or inline, in creation order.
    pub fn schemas(&self) -> impl Iterator<Item = (SchemaId, &Schema)> + '_ {
        self.schemas.iter().enumerate().map(|(i, s)| (SchemaId(i), s))
    }

    /// Top-level named schemas in declaration order.
    pub fn named_schemas(&self) -> impl Iterator<Item = (&str, SchemaId)> + '_ {
        self.table.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Finds a top-level schema by name.
    pub fn lookup(&self, name: &str) -> Option<SchemaId> {
        self.index.get(name).copied()
    }

    /// Operations in declaration order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Total number of nodes, named or inline.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if the model holds no schema nodes.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Mutable staging area for a [`SchemaModel`].
///
/// Supports forward references: [`reserve`](ModelBuilder::reserve) mints an id
/// for a named schema before its shape is known, and
/// [`define`](ModelBuilder::define) fills it in later. This is how cycles are
/// expressed.
///
/// # Examples
///
/// ```
/// use cmdlet_synth_core::{ModelBuilder, Schema, SchemaKind};
///
/// let mut builder = ModelBuilder::new("Tree", "1.0");
/// let node = builder.reserve("Node", "schemas/Node");
/// let children = builder.add_schema(
///     Schema::new(SchemaKind::Array, "schemas/Node/properties/children").with_items(node),
/// );
/// builder.define(
///     node,
///     Schema::new(SchemaKind::Object, "schemas/Node").with_property("children", children, false),
/// );
/// let model = builder.build();
/// assert_eq!(model.schema(children).items, Some(node));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    info: ApiInfo,
    schemas: Vec<Schema>,
    table: Vec<(String, SchemaId)>,
    operations: Vec<Operation>,
}

impl ModelBuilder {
    /// Starts a model for the API `title`/`version`.
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            info: ApiInfo {
                title: title.to_string(),
                version: version.to_string(),
            },
            ..Default::default()
        }
    }

    /// Adds an anonymous (inline) schema node.
    pub fn add_schema(&mut self, schema: Schema) -> SchemaId {
        let id = SchemaId(self.schemas.len());
        self.schemas.push(schema);
        id
    }

    /// Adds a named schema to the top-level table.
    pub fn declare(&mut self, name: &str, schema: Schema) -> SchemaId {
        let id = self.add_schema(schema.with_name(name));
        self.table.push((name.to_string(), id));
        id
    }

    /// Mints an id for a named schema whose shape is defined later.
    pub fn reserve(&mut self, name: &str, path: &str) -> SchemaId {
        self.declare(
            name,
            Schema::new(SchemaKind::Unsupported("unresolved".to_string()), path),
        )
    }

    /// Supplies the shape for a reserved id, keeping its declared name.
    pub fn define(&mut self, id: SchemaId, schema: Schema) {
        let mut schema = schema;
        schema.name = self.schemas[id.0].name.take().or(schema.name);
        self.schemas[id.0] = schema;
    }

    /// Appends an operation.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Freezes the model.
    pub fn build(self) -> SchemaModel {
        let mut index = HashMap::new();
        for (name, id) in &self.table {
            index.entry(name.clone()).or_insert(*id);
        }
        SchemaModel {
            info: self.info,
            schemas: self.schemas,
            table: self.table,
            index,
            operations: self.operations,
        }
    }
}
