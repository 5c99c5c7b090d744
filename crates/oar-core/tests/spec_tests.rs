use oar_core::spec::components::Components;
use oar_core::spec::operation::Operation;
use oar_core::spec::security::{ApiKeyLocation, SecurityScheme, SecuritySchemeType};
use oar_core::spec as document;
use oar_core::{FormatError, HttpMethod, Spec, SpecError};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn parse_petstore() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.info.title, "Petstore");

    let paths: Vec<_> = spec.paths.keys().cloned().collect();
    assert_eq!(paths, vec!["/pets", "/pets/{petId}"]);

    let list = spec.operation(HttpMethod::Get, "/pets").unwrap();
    assert_eq!(list.operation_id.as_deref(), Some("listPets"));
    assert_eq!(list.parameters.len(), 2);
    assert!(list.responses.contains_key("default"));

    let schemas: Vec<_> = spec
        .components
        .as_ref()
        .unwrap()
        .schemas
        .keys()
        .cloned()
        .collect();
    assert_eq!(schemas, vec!["Pet", "Owner", "NewPet", "Pets", "Error", "Node"]);
}

#[test]
fn yaml_and_json_round_trip() {
    let spec = document::from_yaml(PETSTORE).unwrap();

    let yaml = document::to_yaml(&spec).unwrap();
    assert_eq!(document::from_yaml(&yaml).unwrap(), spec);

    let json = document::to_json(&spec).unwrap();
    let reparsed = document::from_json(&json).unwrap();
    assert_eq!(reparsed, spec);

    // Key order survives the trip through JSON.
    let keys: Vec<_> = reparsed.components.unwrap().schemas.keys().cloned().collect();
    assert_eq!(keys, vec!["Pet", "Owner", "NewPet", "Pets", "Error", "Node"]);
}

#[test]
fn unsupported_version() {
    let err = document::from_yaml("openapi: 2.0.0\ninfo:\n  title: Old\n  version: '1'\n")
        .unwrap_err();
    assert!(matches!(err, FormatError::UnsupportedVersion(ref v) if v.as_str() == "2.0.0"));
}

#[test]
fn ensure_accessors_are_idempotent() {
    let mut spec = Spec::new("t", "1");
    spec.security_schemes_ens()
        .insert("basic".to_string(), SecurityScheme::http("basic"));

    let first = spec.components_ens() as *const Components;
    let second = spec.components_ens() as *const Components;
    assert!(std::ptr::eq(first, second));
    assert_eq!(spec.security_schemes_ens().len(), 1);

    spec.path_item_ens("/things").summary = Some("Things".to_string());
    spec.path_item_ens("/things");
    assert_eq!(spec.paths.len(), 1);
    assert_eq!(spec.paths["/things"].summary.as_deref(), Some("Things"));
}

#[test]
fn duplicate_operation_is_rejected_without_mutation() {
    let mut spec = Spec::new("t", "1");
    let first = Operation {
        summary: Some("first".to_string()),
        ..Operation::default()
    };
    let second = Operation {
        summary: Some("second".to_string()),
        ..Operation::default()
    };

    spec.add_operation("POST", "/items", first).unwrap();
    let before = spec.clone();
    let err = spec.add_operation("post", "/items", second).unwrap_err();

    assert!(matches!(err, SpecError::DuplicateOperation { .. }));
    insta::assert_snapshot!(err.to_string(), @"operation already exists: POST /items");
    assert_eq!(spec, before);
    let stored = spec.operation(HttpMethod::Post, "/items").unwrap();
    assert_eq!(stored.summary.as_deref(), Some("first"));
}

#[test]
fn other_methods_share_a_path() {
    let mut spec = Spec::new("t", "1");
    spec.add_operation("GET", "/items", Operation::default())
        .unwrap();
    spec.add_operation("POST", "/items", Operation::default())
        .unwrap();

    let methods: Vec<_> = spec.paths["/items"].operations().map(|(m, _)| m).collect();
    assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
}

#[test]
fn security_helpers() {
    let mut spec = Spec::new("t", "1");
    spec.set_http_basic_security("basic", Some("Admin access"));
    spec.set_http_bearer_token_security("bearer", Some("JWT"), None);
    spec.set_api_key_security("key", "X-API-Key", ApiKeyLocation::Header, None);

    let schemes = &spec.components.as_ref().unwrap().security_schemes;
    let names: Vec<_> = schemes.keys().cloned().collect();
    assert_eq!(names, vec!["basic", "bearer", "key"]);

    assert_eq!(schemes["basic"].scheme.as_deref(), Some("basic"));
    assert_eq!(schemes["basic"].description.as_deref(), Some("Admin access"));
    assert_eq!(schemes["bearer"].bearer_format.as_deref(), Some("JWT"));
    assert_eq!(schemes["key"].scheme_type, SecuritySchemeType::ApiKey);
    assert_eq!(schemes["key"].name.as_deref(), Some("X-API-Key"));
    assert_eq!(schemes["key"].location, Some(ApiKeyLocation::Header));

    let yaml = document::to_yaml(&spec).unwrap();
    assert!(yaml.contains("bearerFormat: JWT"));
    assert!(yaml.contains("type: apiKey"));
}

#[test]
fn resolve_schema_ref_only_follows_local_schemas() {
    let spec = document::from_yaml(PETSTORE).unwrap();
    let (name, _) = spec.resolve_schema_ref("#/components/schemas/Pet").unwrap();
    assert_eq!(name, "Pet");
    assert!(spec.resolve_schema_ref("#/components/schemas/Missing").is_none());
    assert!(spec.resolve_schema_ref("#/components/parameters/limitParam").is_none());
}
