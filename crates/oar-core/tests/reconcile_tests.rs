use indexmap::IndexMap;
use oar_core::reconcile::{COMPONENTS_EXTENSION, from_json_schema, to_json_schema};
use oar_core::spec::{self as document, schema::SchemaOrRef};
use oar_schema::{JsonSchema, SchemaOrBool, SimpleType, TypeSet, X_DEPRECATED};
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

const SHAPES: &str = r#"
openapi: 3.0.3
info:
  title: Shapes
  version: 1.0.0
paths: {}
components:
  schemas:
    Pair:
      type: object
      properties:
        left:
          $ref: '#/components/schemas/Point'
        right:
          $ref: '#/components/schemas/Point'
        label:
          $ref: '#/components/schemas/Label'
    Point:
      type: object
      properties:
        x:
          type: number
        unit:
          $ref: '#/components/schemas/Unit'
    Unit:
      type: string
      enum: [mm, in]
    Label:
      type: string
      maxLength: 10
"#;

fn oschema(yaml: &str) -> SchemaOrRef {
    serde_yaml_ng::from_str(yaml).unwrap()
}

fn component_names(schema: &JsonSchema) -> Vec<String> {
    schema
        .extensions
        .get(COMPONENTS_EXTENSION)
        .and_then(|c| c["schemas"].as_object())
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn generic_round_trip() {
    let mut properties = IndexMap::new();
    properties.insert(
        "name".to_string(),
        JsonSchema {
            schema_type: Some(TypeSet::Multiple(vec![SimpleType::String, SimpleType::Null])),
            min_length: Some(1),
            ..JsonSchema::default()
        },
    );
    properties.insert(
        "age".to_string(),
        JsonSchema {
            minimum: Some(0.0),
            exclusive_minimum: Some(true),
            maximum: Some(150.0),
            ..JsonSchema::typed(SimpleType::Integer)
        },
    );
    properties.insert(
        "tags".to_string(),
        JsonSchema {
            items: Some(Box::new(JsonSchema::typed(SimpleType::String))),
            unique_items: Some(true),
            ..JsonSchema::typed(SimpleType::Array)
        },
    );
    properties.insert(
        "kind".to_string(),
        JsonSchema {
            enum_values: vec![json!("a"), json!("b")],
            default_value: Some(json!("a")),
            examples: vec![json!("a")],
            ..JsonSchema::typed(SimpleType::String)
        },
    );
    let mut owner = JsonSchema::reference("#/components/schemas/User");
    owner.extensions.insert(X_DEPRECATED.to_string(), json!(true));
    properties.insert("owner".to_string(), owner);
    properties.insert("anything".to_string(), JsonSchema::default());
    properties.insert("nothing".to_string(), JsonSchema::never());

    let mut extensions = IndexMap::new();
    extensions.insert("x-internal".to_string(), json!(true));

    let generic = JsonSchema {
        title: Some("Person".to_string()),
        description: Some("Somebody".to_string()),
        properties,
        required: vec!["name".to_string()],
        additional_properties: Some(SchemaOrBool::Bool(false)),
        extensions,
        ..JsonSchema::typed(SimpleType::Object)
    };

    let converted = from_json_schema(&generic);
    assert_eq!(to_json_schema(&converted, None), generic);
}

#[test]
fn single_use_definitions_are_inlined() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    let root = SchemaOrRef::reference("#/components/schemas/Pets");
    let schema = to_json_schema(&root, Some(&spec));

    assert!(schema.reference.is_none());
    assert!(schema.has_type(SimpleType::Array));
    assert_eq!(schema.max_items, Some(100));
    let pet = schema.items.as_deref().unwrap();
    assert_eq!(pet.required, vec!["id", "name"]);
    let owner = &pet.properties["owner"];
    assert!(owner.reference.is_none());
    assert!(owner.properties.contains_key("name"));
    assert!(component_names(&schema).is_empty());
}

#[test]
fn shared_definitions_are_emitted_once() {
    let spec = document::from_yaml(SHAPES).unwrap();
    let root = SchemaOrRef::reference("#/components/schemas/Pair");
    let schema = to_json_schema(&root, Some(&spec));

    let point = JsonSchema::reference("#/components/schemas/Point");
    assert_eq!(schema.properties["left"], point);
    assert_eq!(schema.properties["right"], point);
    assert_eq!(schema.properties["label"].max_length, Some(10));
    assert_eq!(component_names(&schema), vec!["Point"]);

    let components = &schema.extensions[COMPONENTS_EXTENSION];
    assert_eq!(
        components["schemas"]["Point"]["properties"]["unit"],
        json!({"type": "string", "enum": ["mm", "in"]})
    );
}

#[test]
fn recursive_definitions_stay_referenced() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    let root = SchemaOrRef::reference("#/components/schemas/Node");
    let schema = to_json_schema(&root, Some(&spec));

    assert_eq!(schema.reference.as_deref(), Some("#/components/schemas/Node"));
    assert_eq!(component_names(&schema), vec!["Node"]);
    let node = &schema.extensions[COMPONENTS_EXTENSION]["schemas"]["Node"];
    assert_eq!(
        node["properties"]["children"]["items"],
        json!({"$ref": "#/components/schemas/Node"})
    );
}

#[test]
fn malformed_refs_pass_through() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    for target in ["#/definitions/Pet", "other.yaml#/components/schemas/Pet"] {
        let schema = to_json_schema(&SchemaOrRef::reference(target), Some(&spec));
        assert_eq!(schema, JsonSchema::reference(target));
    }
}

#[test]
fn deprecated_reference_is_inlined_as_deprecated() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    let schema = oschema(
        r#"
allOf:
  - $ref: '#/components/schemas/Owner'
  - deprecated: true
"#,
    );
    let converted = to_json_schema(&schema, Some(&spec));
    assert_eq!(converted.deprecated, Some(true));
    assert!(converted.properties.contains_key("name"));
    assert!(converted.all_of.is_empty());
}

#[test]
fn deprecated_reference_round_trips_without_document() {
    let schema = oschema(
        r#"
allOf:
  - $ref: '#/components/schemas/Owner'
  - deprecated: true
"#,
    );
    let generic = to_json_schema(&schema, None);
    assert_eq!(generic.reference.as_deref(), Some("#/components/schemas/Owner"));
    assert!(generic.is_deprecated_site());
    assert_eq!(from_json_schema(&generic), schema);
}

#[test]
fn reference_extensions_round_trip() {
    let generic: JsonSchema = serde_json::from_value(json!({
        "$ref": "#/components/schemas/Pet",
        "x-order": 3,
    }))
    .unwrap();
    let converted = from_json_schema(&generic);
    let expected = oschema(
        r#"
allOf:
  - $ref: '#/components/schemas/Pet'
x-order: 3
"#,
    );
    assert_eq!(converted, expected);
    assert_eq!(to_json_schema(&converted, None), generic);
}

#[test]
fn deprecated_reference_keeps_extensions() {
    let generic: JsonSchema = serde_json::from_value(json!({
        "$ref": "#/components/schemas/Owner",
        "x-deprecated": true,
        "x-order": 3,
    }))
    .unwrap();
    let converted = from_json_schema(&generic);
    let expected = oschema(
        r#"
allOf:
  - $ref: '#/components/schemas/Owner'
  - deprecated: true
x-order: 3
"#,
    );
    assert_eq!(converted, expected);
    assert_eq!(to_json_schema(&converted, None), generic);

    let spec = document::from_yaml(PETSTORE).unwrap();
    let inlined = to_json_schema(&converted, Some(&spec));
    assert_eq!(inlined.deprecated, Some(true));
    assert!(inlined.properties.contains_key("name"));
    assert_eq!(inlined.extensions.get("x-order"), Some(&json!(3)));
    assert!(!inlined.extensions.contains_key(X_DEPRECATED));
}

#[test]
fn deprecated_schema_uses_first_class_flag() {
    let schema = oschema(
        r#"
type: string
deprecated: true
"#,
    );
    let generic = to_json_schema(&schema, None);
    assert_eq!(generic.deprecated, Some(true));
    assert!(!generic.extensions.contains_key(X_DEPRECATED));
    assert_eq!(from_json_schema(&generic), schema);
}

#[test]
fn nullable_and_exclusive_bounds() {
    let schema = oschema(
        r#"
type: integer
nullable: true
exclusiveMinimum: 5
maximum: 10
"#,
    );
    let generic = to_json_schema(&schema, None);
    assert_eq!(
        generic.schema_type,
        Some(TypeSet::Multiple(vec![SimpleType::Integer, SimpleType::Null]))
    );
    assert_eq!(generic.minimum, Some(5.0));
    assert_eq!(generic.exclusive_minimum, Some(true));
    assert_eq!(generic.maximum, Some(10.0));
    assert_eq!(generic.exclusive_maximum, None);

    assert_eq!(from_json_schema(&generic), schema);
}

#[test]
fn boolean_schemas() {
    let schema = oschema(
        r#"
type: object
properties:
  anything: true
  nothing: false
"#,
    );
    let generic = to_json_schema(&schema, None);
    assert_eq!(generic.properties["anything"], JsonSchema::default());
    assert_eq!(generic.properties["nothing"], JsonSchema::never());

    let back = from_json_schema(&generic);
    let back = back.as_schema().unwrap();
    assert!(matches!(back.properties["anything"], SchemaOrRef::Schema(_)));
    assert!(matches!(back.properties["nothing"], SchemaOrRef::Schema(_)));
}

#[test]
fn discriminator_travels_as_extension() {
    let schema = oschema(
        r#"
oneOf:
  - $ref: '#/components/schemas/Cat'
  - $ref: '#/components/schemas/Dog'
discriminator:
  propertyName: petType
"#,
    );
    let generic = to_json_schema(&schema, None);
    assert_eq!(
        generic.extensions["discriminator"],
        json!({"propertyName": "petType"})
    );
    assert_eq!(from_json_schema(&generic), schema);
}
