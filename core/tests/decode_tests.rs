use cmdlet_synth_core::naming::{camel_case, deconstruct, kebab_case, to_pascal_case};
use cmdlet_synth_core::{
    DocumentError, ModelIssue, ParameterLocation, PrimitiveType, SchemaKind, SchemaModel, validate_model,
};

const CATALOG: &str = include_str!("fixtures/catalog.json");

fn catalog() -> SchemaModel {
    SchemaModel::from_json_str(CATALOG).unwrap()
}

// ---------------------------------------------------------------------------
// Schema table
// ---------------------------------------------------------------------------

#[test]
fn test_catalog_decodes_clean() {
    let model = catalog();

    assert_eq!(model.info().title, "Catalog Service");
    assert_eq!(model.info().version, "2.1");
    assert!(validate_model(&model).is_empty());

    let names: Vec<&str> = model.named_schemas().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Category", "Visibility", "Labels"]);
}

#[test]
fn test_recursive_schema_shares_identity() {
    let model = catalog();
    let category = model.lookup("Category").unwrap();
    let schema = model.schema(category);

    assert_eq!(schema.description.as_deref(), Some("A node in the category tree."));
    assert!(schema.is_required("id"));

    let parent = &schema.properties[1];
    assert_eq!(parent.name, "parent");
    assert_eq!(parent.schema, category);

    let children = model.schema(schema.properties[2].schema);
    assert_eq!(children.kind(), &SchemaKind::Array);
    assert_eq!(children.items, Some(category));
}

#[test]
fn test_formats_select_primitives() {
    let model = catalog();
    let category = model.schema(model.lookup("Category").unwrap());
    let kind_of = |name: &str| {
        let property = category.properties.iter().find(|p| p.name == name).unwrap();
        model.schema(property.schema).kind().clone()
    };

    assert_eq!(kind_of("id"), SchemaKind::Primitive(PrimitiveType::Uuid));
    assert_eq!(kind_of("createdAt"), SchemaKind::Primitive(PrimitiveType::DateTime));
    assert_eq!(kind_of("rank"), SchemaKind::Primitive(PrimitiveType::Int64));
}

#[test]
fn test_enum_and_map_shapes() {
    let model = catalog();

    let visibility = model.schema(model.lookup("Visibility").unwrap());
    assert_eq!(visibility.kind(), &SchemaKind::Enum);
    assert_eq!(visibility.enum_values, vec!["public", "internal"]);
    assert_eq!(visibility.default, Some(serde_json::json!("public")));

    let labels = model.schema(model.lookup("Labels").unwrap());
    assert_eq!(labels.kind(), &SchemaKind::Map);
    let element = model.schema(labels.items.unwrap());
    assert_eq!(element.kind(), &SchemaKind::Primitive(PrimitiveType::String));
    assert_eq!(element.path, "schemas/Labels/additionalProperties");
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[test]
fn test_operation_parameters() {
    let model = catalog();
    let get = &model.operations()[0];

    assert_eq!(get.operation_id, "Categories_Get");
    assert_eq!(get.response, model.lookup("Category"));

    let id = &get.parameters[0];
    assert_eq!(id.location, ParameterLocation::Path);
    assert!(id.required);
    assert_eq!(id.aliases, vec!["Id"]);
    assert_eq!(model.schema(id.schema).path, "operations/Categories_Get/parameters/categoryId");

    let trace = &get.parameters[1];
    assert_eq!(trace.location, ParameterLocation::Header);
    assert!(!trace.required);
}

#[test]
fn test_binary_body_without_response() {
    let model = catalog();
    let upload = &model.operations()[1];

    assert!(upload.response.is_none());
    assert_eq!(upload.parameters[0].location, ParameterLocation::Body);
    assert_eq!(
        model.schema(upload.parameters[0].schema).kind(),
        &SchemaKind::Primitive(PrimitiveType::Binary)
    );
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_document_is_a_parse_error() {
    assert!(matches!(SchemaModel::from_json_str("{"), Err(DocumentError::Json(_))));
    assert!(matches!(
        SchemaModel::from_yaml_str("schemas: [unclosed"),
        Err(DocumentError::Yaml(_))
    ));
}

#[test]
fn test_validation_collects_operation_issues() {
    let model = SchemaModel::from_yaml_str(
        r#"
operations:
  - operationId: ""
  - operationId: Categories_Get
  - operationId: Categories_Get
"#,
    )
    .unwrap();

    assert_eq!(
        validate_model(&model),
        vec![
            ModelIssue::EmptyOperationId,
            ModelIssue::DuplicateOperationId("Categories_Get".to_string()),
        ]
    );
}

// ---------------------------------------------------------------------------
// Naming over decoded identifiers
// ---------------------------------------------------------------------------

#[test]
fn test_names_from_operation_ids() {
    let model = catalog();
    let id = &model.operations()[0].operation_id;

    assert_eq!(deconstruct(id), vec!["categories", "get"]);
    assert_eq!(to_pascal_case(id), "CategoriesGet");
    assert_eq!(camel_case(&deconstruct("x-trace")), "xTrace");
    assert_eq!(kebab_case(&deconstruct("createdAt")), "created-at");
}
