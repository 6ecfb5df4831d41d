//! API description decoding.
//!
//! Turns a JSON or YAML API description into a [`SchemaModel`]. The document
//! shape is a trimmed OpenAPI dialect:
//!
//! ```yaml
//! info:
//!   title: Contoso
//!   version: "1.0"
//! schemas:
//!   Widget:
//!     type: object
//!     required: [name]
//!     properties:
//!       name: { type: string }
//!       count: { type: integer }
//! operations:
//!   - operationId: listWidgets
//!     response:
//!       type: array
//!       items: { $ref: Widget }
//! ```
//!
//! Map order is preserved, so the schema table and every property list come
//! out in declaration order. `$ref` shares a named node (and may form cycles);
//! everything else becomes a fresh inline node with its own identity.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{DocumentError, Result};
use crate::types::{
    ModelBuilder, Operation, Parameter, ParameterLocation, PrimitiveType, Schema, SchemaId,
    SchemaKind, SchemaModel,
};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    info: InfoDoc,
    #[serde(default, deserialize_with = "ordered_map")]
    schemas: Vec<(String, SchemaDoc)>,
    #[serde(default)]
    operations: Vec<OperationDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct InfoDoc {
    #[serde(default)]
    title: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDoc {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    ty: Option<String>,
    format: Option<String>,
    title: Option<String>,
    description: Option<String>,
    default: Option<serde_json::Value>,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "ordered_map")]
    properties: Vec<(String, SchemaDoc)>,
    #[serde(default)]
    required: Vec<String>,
    items: Option<Box<SchemaDoc>>,
    additional_properties: Option<AdditionalProperties>,
    #[serde(default)]
    one_of: Vec<SchemaDoc>,
    discriminator: Option<DiscriminatorDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdditionalProperties {
    Schema(Box<SchemaDoc>),
    /// `true` / `false`; neither changes the shape.
    Flag(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscriminatorDoc {
    property_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationDoc {
    operation_id: String,
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<ParameterDoc>,
    response: Option<SchemaDoc>,
}

#[derive(Debug, Deserialize)]
struct ParameterDoc {
    name: String,
    #[serde(rename = "in", default)]
    location: ParameterLocation,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    aliases: Vec<String>,
    description: Option<String>,
    schema: SchemaDoc,
}

/// Deserializes a map into a `Vec` of entries, keeping source order.
fn ordered_map<'de, D, V>(deserializer: D) -> std::result::Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

impl SchemaModel {
    /// Decodes a JSON API description.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Json`] for malformed input, and
    /// [`DocumentError::UnresolvedReference`] / [`DocumentError::InvalidSchema`]
    /// when the description is well-formed but inconsistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdlet_synth_core::{SchemaKind, SchemaModel};
    ///
    /// let model = SchemaModel::from_json_str(
    ///     r#"{"schemas": {"Color": {"type": "string", "enum": ["red", "blue"]}}}"#,
    /// )
    /// .unwrap();
    /// let color = model.lookup("Color").unwrap();
    /// assert_eq!(model.schema(color).kind(), &SchemaKind::Enum);
    /// assert_eq!(model.schema(color).enum_values, vec!["red", "blue"]);
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(input)?;
        lower(document)
    }

    /// Decodes a YAML API description.
    ///
    /// # Errors
    ///
    /// Same as [`from_json_str`](SchemaModel::from_json_str), with
    /// [`DocumentError::Yaml`] for malformed input.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let document: Document = serde_yaml::from_str(input)?;
        lower(document)
    }
}

fn lower(document: Document) -> Result<SchemaModel> {
    let mut lowering = Lowering {
        builder: ModelBuilder::new(&document.info.title, &document.info.version),
        names: HashMap::new(),
    };

    // Reserve every named node first so references may point forward or at
    // themselves.
    let mut reserved = Vec::with_capacity(document.schemas.len());
    for (name, _) in &document.schemas {
        let path = format!("schemas/{name}");
        let id = lowering.builder.reserve(name, &path);
        lowering.names.entry(name.clone()).or_insert(id);
        reserved.push((id, path));
    }

    for ((id, path), (_, doc)) in reserved.into_iter().zip(&document.schemas) {
        if doc.reference.is_some() {
            return Err(DocumentError::InvalidSchema {
                path,
                reason: "a named schema cannot be a bare reference".to_string(),
            });
        }
        let schema = lowering.shape(doc, &path)?;
        lowering.builder.define(id, schema);
    }

    for op in &document.operations {
        let base = format!("operations/{}", op.operation_id);
        let mut operation = Operation::new(&op.operation_id);
        operation.description = op.description.clone();

        for param in &op.parameters {
            let path = format!("{base}/parameters/{}", param.name);
            let schema = lowering.node(&param.schema, &path)?;
            let mut parameter = Parameter::new(&param.name, param.location, schema, param.required);
            parameter.aliases = param.aliases.clone();
            parameter.description = param.description.clone();
            operation.parameters.push(parameter);
        }

        if let Some(response) = &op.response {
            operation.response = Some(lowering.node(response, &format!("{base}/response"))?);
        }

        lowering.builder.add_operation(operation);
    }

    Ok(lowering.builder.build())
}

struct Lowering {
    builder: ModelBuilder,
    names: HashMap<String, SchemaId>,
}

impl Lowering {
    /// Resolves a reference or adds a new inline node.
    fn node(&mut self, doc: &SchemaDoc, path: &str) -> Result<SchemaId> {
        if let Some(reference) = &doc.reference {
            let name = reference.rsplit('/').next().unwrap_or(reference);
            return self
                .names
                .get(name)
                .copied()
                .ok_or_else(|| DocumentError::UnresolvedReference {
                    path: path.to_string(),
                    reference: reference.clone(),
                });
        }
        let schema = self.shape(doc, path)?;
        Ok(self.builder.add_schema(schema))
    }

    fn shape(&mut self, doc: &SchemaDoc, path: &str) -> Result<Schema> {
        let kind = classify(doc, path)?;
        let mut schema = Schema::new(kind.clone(), path);
        schema.name = doc.title.clone();
        schema.description = doc.description.clone();
        schema.default = doc.default.clone();

        match kind {
            SchemaKind::Object => {
                for (name, prop) in &doc.properties {
                    let id = self.node(prop, &format!("{path}/properties/{name}"))?;
                    schema = schema.with_property(name, id, false);
                }
                schema.required = doc.required.clone();
            }
            SchemaKind::Enum => {
                schema.enum_values = doc
                    .enum_values
                    .iter()
                    .flatten()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
            }
            SchemaKind::Array => {
                if let Some(items) = &doc.items {
                    schema.items = Some(self.node(items, &format!("{path}/items"))?);
                }
            }
            SchemaKind::Map => {
                if let Some(AdditionalProperties::Schema(items)) = &doc.additional_properties {
                    schema.items = Some(self.node(items, &format!("{path}/additionalProperties"))?);
                }
            }
            SchemaKind::Union => {
                for (i, variant) in doc.one_of.iter().enumerate() {
                    let id = self.node(variant, &format!("{path}/oneOf/{i}"))?;
                    schema.variants.push(id);
                }
                schema.discriminator = doc.discriminator.as_ref().map(|d| d.property_name.clone());
            }
            SchemaKind::Primitive(_) | SchemaKind::Boolean | SchemaKind::Unsupported(_) => {}
        }

        Ok(schema)
    }
}

fn classify(doc: &SchemaDoc, path: &str) -> Result<SchemaKind> {
    if !doc.one_of.is_empty() {
        return Ok(SchemaKind::Union);
    }
    if doc.enum_values.is_some() {
        return Ok(SchemaKind::Enum);
    }

    let kind = match doc.ty.as_deref() {
        None | Some("object") => match &doc.additional_properties {
            Some(AdditionalProperties::Schema(_)) if doc.properties.is_empty() => SchemaKind::Map,
            _ => SchemaKind::Object,
        },
        Some("array") => {
            if doc.items.is_none() {
                return Err(DocumentError::InvalidSchema {
                    path: path.to_string(),
                    reason: "array schema requires items".to_string(),
                });
            }
            SchemaKind::Array
        }
        Some("boolean") => SchemaKind::Boolean,
        Some("string") => SchemaKind::Primitive(match doc.format.as_deref() {
            Some("date-time") => PrimitiveType::DateTime,
            Some("date") => PrimitiveType::Date,
            Some("duration") => PrimitiveType::Duration,
            Some("uuid") => PrimitiveType::Uuid,
            Some("byte") => PrimitiveType::ByteArray,
            Some("binary") => PrimitiveType::Binary,
            _ => PrimitiveType::String,
        }),
        Some("integer") => SchemaKind::Primitive(match doc.format.as_deref() {
            Some("int64") => PrimitiveType::Int64,
            _ => PrimitiveType::Int32,
        }),
        Some("number") => SchemaKind::Primitive(match doc.format.as_deref() {
            Some("float") => PrimitiveType::Float,
            _ => PrimitiveType::Number,
        }),
        Some(other) => SchemaKind::Unsupported(other.to_string()),
    };

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGETS: &str = r##"
info:
  title: Contoso Widgets
  version: "2024-01-01"
schemas:
  Widget:
    type: object
    required: [name]
    properties:
      name: { type: string }
      count: { type: integer }
      parent: { $ref: Widget }
  Gadget:
    type: object
    properties:
      tags:
        type: object
        additionalProperties: { type: string }
operations:
  - operationId: listWidgets
    parameters:
      - name: filter
        in: query
        schema: { type: string }
    response:
      type: array
      items: { $ref: "#/components/schemas/Widget" }
"##;

    #[test]
    fn test_decode_preserves_order_and_paths() {
        let model = SchemaModel::from_yaml_str(WIDGETS).unwrap();
        let names: Vec<&str> = model.named_schemas().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Widget", "Gadget"]);

        let widget = model.schema(model.lookup("Widget").unwrap());
        let props: Vec<&str> = widget.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["name", "count", "parent"]);
        assert!(widget.is_required("name"));
        assert!(!widget.is_required("count"));

        let count = model.schema(widget.properties[1].schema);
        assert_eq!(count.kind(), &SchemaKind::Primitive(PrimitiveType::Int32));
        assert_eq!(count.path, "schemas/Widget/properties/count");
    }

    #[test]
    fn test_decode_self_reference_shares_identity() {
        let model = SchemaModel::from_yaml_str(WIDGETS).unwrap();
        let widget_id = model.lookup("Widget").unwrap();
        let parent = &model.schema(widget_id).properties[2];
        assert_eq!(parent.schema, widget_id);

        let response = model.operations()[0].response.unwrap();
        assert_eq!(model.schema(response).items, Some(widget_id));
    }

    #[test]
    fn test_decode_map_from_additional_properties() {
        let model = SchemaModel::from_yaml_str(WIDGETS).unwrap();
        let gadget = model.schema(model.lookup("Gadget").unwrap());
        let tags = model.schema(gadget.properties[0].schema);
        assert_eq!(tags.kind(), &SchemaKind::Map);
        assert!(tags.items.is_some());
    }

    #[test]
    fn test_decode_additional_properties_flag_keeps_object() {
        let model = SchemaModel::from_yaml_str(
            "schemas:\n  Open:\n    type: object\n    additionalProperties: true\n  \
             Closed:\n    type: object\n    additionalProperties: false\n",
        )
        .unwrap();
        for name in ["Open", "Closed"] {
            let schema = model.schema(model.lookup(name).unwrap());
            assert_eq!(schema.kind(), &SchemaKind::Object);
            assert!(schema.items.is_none());
        }
    }

    #[test]
    fn test_decode_unresolved_reference() {
        let err = SchemaModel::from_yaml_str(
            "schemas:\n  A:\n    type: object\n    properties:\n      b: { $ref: Missing }\n",
        )
        .unwrap_err();
        match err {
            DocumentError::UnresolvedReference { path, reference } => {
                assert_eq!(path, "schemas/A/properties/b");
                assert_eq!(reference, "Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_unknown_type_is_kept_for_the_resolver() {
        let model = SchemaModel::from_json_str(r#"{"schemas": {"Upload": {"type": "file"}}}"#).unwrap();
        let upload = model.schema(model.lookup("Upload").unwrap());
        assert_eq!(upload.kind(), &SchemaKind::Unsupported("file".to_string()));
    }

    #[test]
    fn test_decode_union_with_discriminator() {
        let json = r#"{
            "schemas": {
                "Cat": {"type": "object", "properties": {"kind": {"type": "string"}}},
                "Dog": {"type": "object", "properties": {"kind": {"type": "string"}}},
                "Pet": {"oneOf": [{"$ref": "Cat"}, {"$ref": "Dog"}], "discriminator": {"propertyName": "kind"}}
            }
        }"#;
        let model = SchemaModel::from_json_str(json).unwrap();
        let pet = model.schema(model.lookup("Pet").unwrap());
        assert_eq!(pet.kind(), &SchemaKind::Union);
        assert_eq!(pet.discriminator.as_deref(), Some("kind"));
        assert_eq!(pet.variants, vec![model.lookup("Cat").unwrap(), model.lookup("Dog").unwrap()]);
    }

    #[test]
    fn test_decode_array_without_items_is_invalid() {
        let err = SchemaModel::from_json_str(r#"{"schemas": {"List": {"type": "array"}}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidSchema { .. }));
    }
}
