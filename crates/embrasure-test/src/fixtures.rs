//! End-to-end tests over the shared fixture documents.

use serde_json::json;

use embrasure::{BuildError, CompileError, Placement};

use crate::{registry_from_fixture, registry_from_route_table, TestError};

#[test]
fn swagger_routes_keep_document_order() {
    let registry = registry_from_fixture("petstore-swagger.yaml", None).unwrap();
    let names: Vec<&str> = registry.routes().map(|r| r.route_name.as_str()).collect();
    assert_eq!(names, vec!["list-pets", "create-pet", "get-pet", "delete-pet"]);
    assert!(registry.route("DeletePet").unwrap().deprecated);
}

#[test]
fn swagger_base_path_and_host() {
    let registry = registry_from_fixture("petstore-swagger.yaml", None).unwrap();
    assert_eq!(registry.base_url(), "https://petstore.example.com");

    let request = registry
        .request_for("get-pet", &json!({"pet-id": 5}))
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"method": "get", "url": "https://petstore.example.com/v1/pets/5"})
    );
}

#[test]
fn swagger_query_defaults_and_coercion() {
    let registry = registry_from_fixture("petstore-swagger.yaml", Some("http://localhost")).unwrap();

    let request = registry.request_for("list-pets", &json!({})).unwrap().unwrap();
    assert_eq!(request.url, "http://localhost/v1/pets");
    assert_eq!(request.query_params.unwrap()["limit"], 20);

    let request = registry
        .request_for("list-pets", &json!({"limit": "5", "tag": "dog"}))
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(request.query_params.unwrap()).unwrap(),
        json!({"limit": 5, "tag": "dog"})
    );
}

#[test]
fn swagger_body_and_headers() {
    let registry = registry_from_fixture("petstore-swagger.yaml", Some("http://localhost")).unwrap();
    let request = registry
        .request_for(
            "create-pet",
            &json!({"name": "Rex", "type": "Dog", "age": "3", "x-request-id": "r1"}),
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "method": "post",
            "url": "http://localhost/v1/pets",
            "body": {"name": "Rex", "type": "Dog", "age": 3},
            "headers": {"X-Request-ID": "r1"}
        })
    );
}

#[test]
fn swagger_response_schemas() {
    let registry = registry_from_fixture("petstore-swagger.yaml", None).unwrap();
    let route = registry.route("get-pet").unwrap();
    assert!(route.response_for(200).unwrap().body.is_some());
    assert_eq!(
        route.response_for(404).unwrap().description.as_deref(),
        Some("Client error")
    );
    assert!(route.response_for(500).is_none());
}

#[test]
fn openapi_nested_body() {
    let registry = registry_from_fixture("petstore-openapi.yaml", None).unwrap();
    assert_eq!(registry.base_url(), "https://petstore.example.com/v2");

    let request = registry
        .request_for("create-pet", &json!({"pet": {"name": "Rex", "age": "2"}}))
        .unwrap()
        .unwrap();
    assert_eq!(request.url, "https://petstore.example.com/v2/pets");
    assert_eq!(request.body, Some(json!({"name": "Rex", "age": 2})));
}

#[test]
fn openapi_form_body() {
    let registry = registry_from_fixture("petstore-openapi.yaml", Some("http://h")).unwrap();

    let request = registry
        .request_for(
            "upload-photo",
            &json!({"pet-id": 1, "caption": "hi", "width": "640"}),
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "method": "post",
            "url": "http://h/pets/1/photo",
            "formParams": {"caption": "hi", "width": 640}
        })
    );

    let err = registry
        .request_for("upload-photo", &json!({"pet-id": 1}))
        .unwrap_err();
    assert!(matches!(err, BuildError::Coercion { placement: Placement::Form, .. }));
    assert_eq!(err.fields(), vec!["caption"]);
}

#[test]
fn route_table_fixture() {
    let registry = registry_from_route_table("routes.yaml", "http://h").unwrap();

    let request = registry.request_for("search-pets", &json!({})).unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"method": "get", "url": "http://h/pets", "queryParams": {"pageSize": 10}})
    );

    assert_eq!(
        registry.url_for("get-pet", &json!({"id": "12"})).unwrap().as_deref(),
        Some("http://h/pets/12")
    );
}

#[test]
fn invalid_fixtures_fail_to_compile() {
    let err = registry_from_fixture("invalid-missing-operation-id.yaml", None).unwrap_err();
    assert!(matches!(
        err,
        TestError::Compile(CompileError::MissingOperationId(ref loc)) if loc == "GET /pets"
    ));

    let err = registry_from_fixture("invalid-path-template.yaml", None).unwrap_err();
    assert!(matches!(
        err,
        TestError::Compile(CompileError::InvalidPathTemplate(_))
    ));
}

#[test]
fn missing_fixture_is_a_read_error() {
    let err = registry_from_fixture("no-such-fixture.yaml", None).unwrap_err();
    assert!(matches!(err, TestError::Read { .. }));
}
