use oar_core::spec::operation::Operation;
use oar_core::spec::parameter::{Parameter, ParameterLocation};
use oar_core::{Spec, SpecError};

fn operation(params: Vec<Parameter>) -> Operation {
    Operation {
        parameters: params.into_iter().map(Into::into).collect(),
        ..Operation::default()
    }
}

fn path(name: &str) -> Parameter {
    Parameter::new(name, ParameterLocation::Path)
}

fn query(name: &str) -> Parameter {
    Parameter::new(name, ParameterLocation::Query)
}

#[test]
fn placeholders_match_path_parameters() {
    let mut spec = Spec::new("Dates", "1.0.0");
    let op = operation(vec![path("month"), path("day"), path("year")]);
    spec.add_operation("GET", "/{month}-{day}-{year}", op).unwrap();
    assert!(spec.paths.contains_key("/{month}-{day}-{year}"));
}

#[test]
fn mismatched_names_report_both_sides() {
    let mut spec = Spec::new("t", "1");
    let err = spec
        .add_operation("GET", "/{foo}", operation(vec![path("bar")]))
        .unwrap_err();

    insta::assert_snapshot!(
        err.to_string(),
        @"validate path params get /{foo}: undefined path parameter: bar, missing path parameter placeholder in url: foo"
    );
    assert!(spec.paths.is_empty());
}

#[test]
fn duplicates_are_reported_once_per_pair() {
    let mut spec = Spec::new("t", "1");
    let op = operation(vec![path("foo"), path("foo"), query("bar"), query("bar")]);
    let err = spec.add_operation("POST", "/{foo}", op).unwrap_err();

    match &err {
        SpecError::PathParams { issues, .. } => assert_eq!(issues.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    insta::assert_snapshot!(
        err.to_string(),
        @"validate path params post /{foo}: duplicate parameter in path: foo, duplicate parameter in query: bar"
    );
}

#[test]
fn same_name_in_different_locations_is_allowed() {
    let mut spec = Spec::new("t", "1");
    let op = operation(vec![path("id"), query("id")]);
    spec.add_operation("GET", "/items/{id}", op).unwrap();
}

#[test]
fn unsupported_method_is_rejected_first() {
    let mut spec = Spec::new("t", "1");
    let err = spec
        .add_operation("CONNECT", "/{foo}", operation(vec![path("bar")]))
        .unwrap_err();

    assert!(matches!(err, SpecError::UnsupportedMethod(_)));
    insta::assert_snapshot!(err.to_string(), @"unexpected http method: CONNECT");
}

#[test]
fn pattern_suffix_is_stripped_from_stored_path() {
    let mut spec = Spec::new("t", "1");
    let op = operation(vec![path("id"), path("year")]);
    spec.add_operation("get", "/users/{id:[0-9]+}/{year:[0-9]{4}}", op)
        .unwrap();

    let keys: Vec<_> = spec.paths.keys().cloned().collect();
    assert_eq!(keys, vec!["/users/{id}/{year}"]);
}

#[test]
fn lowercase_methods_are_accepted() {
    let mut spec = Spec::new("t", "1");
    spec.add_operation("patch", "/things", Operation::default())
        .unwrap();
    assert!(spec.paths["/things"].patch.is_some());
}
