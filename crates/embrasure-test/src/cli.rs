//! CLI regression tests for the `embrasure` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats.
//!
//! Run with: `cargo test -p embrasure-test`
//! Requires the `embrasure` binary to be built first (`cargo build -p embrasure`).

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

use crate::fixture;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `embrasure` binary.
fn embrasure() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("embrasure")
        .expect("embrasure binary not found, run `cargo build -p embrasure` first");
    cmd.env_remove("EMBRASURE_BASE_URL")
        .env_remove("EMBRASURE_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    let s = String::from_utf8(output.to_vec()).expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("output should be valid JSON")
}

// ---------------------------------------------------------------------------
// embrasure routes
// ---------------------------------------------------------------------------

#[test]
fn routes_lists_route_names() {
    embrasure()
        .args(["routes", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .stdout(contains("list-pets GET /v1/pets"))
        .stdout(contains("get-pet GET /v1/pets/{petId}"));
}

#[test]
fn routes_json_format_outputs_valid_json() {
    let output = embrasure()
        .args(["routes", "--format", "json", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = stdout_json(&output);
    let routes = v.as_array().expect("routes should be an array");
    assert_eq!(routes.len(), 4);
    assert_eq!(routes[0]["routeName"], "list-pets");
    assert_eq!(routes[3]["deprecated"], true);
}

#[test]
fn routes_accepts_route_tables() {
    embrasure()
        .args(["routes", "--spec"])
        .arg(fixture("routes.yaml"))
        .assert()
        .success()
        .stdout(contains("search-pets GET /pets"));
}

#[test]
fn routes_missing_file_exits_one() {
    embrasure()
        .args(["routes", "--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error:"));
}

#[test]
fn routes_missing_operation_id_exits_one() {
    embrasure()
        .args(["routes", "--spec"])
        .arg(fixture("invalid-missing-operation-id.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1020"));
}

#[test]
fn routes_invalid_path_template_exits_one() {
    embrasure()
        .args(["routes", "--spec"])
        .arg(fixture("invalid-path-template.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1054"));
}

#[test]
fn routes_accepts_json_log_format() {
    embrasure()
        .args(["--log-format", "json", "routes", "--spec"])
        .arg(fixture("routes.yaml"))
        .assert()
        .success();
}

#[test]
fn unknown_log_format_exits_two() {
    embrasure()
        .args(["--log-format", "xml", "routes", "--spec"])
        .arg(fixture("routes.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown log format 'xml'"));
}

#[test]
fn routes_missing_spec_flag_exits_two() {
    embrasure().args(["routes"]).assert().failure().code(2);
}

// ---------------------------------------------------------------------------
// embrasure explore
// ---------------------------------------------------------------------------

#[test]
fn explore_prints_route_summary() {
    let output = embrasure()
        .args(["explore", "--route", "create-pet", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = stdout_json(&output);
    assert_eq!(v["method"], "post");
    assert_eq!(v["path"], "/v1/pets");
    assert_eq!(v["parameters"]["body"], serde_json::json!(["name", "type", "age"]));
    assert_eq!(v["parameters"]["header"], serde_json::json!(["x-request-id"]));
}

#[test]
fn explore_unknown_route_exits_two() {
    embrasure()
        .args(["explore", "--route", "no-such-route", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown route"));
}

// ---------------------------------------------------------------------------
// embrasure url
// ---------------------------------------------------------------------------

#[test]
fn url_renders_path_params() {
    embrasure()
        .args(["url", "--route", "get-pet", "--params", r#"{"petId": 123}"#, "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .stdout("https://petstore.example.com/v1/pets/123\n");
}

#[test]
fn url_base_url_from_env() {
    embrasure()
        .env("EMBRASURE_BASE_URL", "http://localhost:8080")
        .args(["url", "--route", "GetPet", "--params", r#"{"pet-id": 1}"#, "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .stdout("http://localhost:8080/v1/pets/1\n");
}

#[test]
fn url_missing_path_param_exits_one() {
    embrasure()
        .args(["url", "--route", "get-pet", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("petId"));
}

#[test]
fn url_unknown_route_exits_two() {
    embrasure()
        .args(["url", "--route", "no-such-route", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(2);
}

// ---------------------------------------------------------------------------
// embrasure request
// ---------------------------------------------------------------------------

#[test]
fn request_prints_descriptor() {
    let output = embrasure()
        .args([
            "request",
            "--route",
            "create-pet",
            "--base-url",
            "http://h",
            "--params",
            r#"{"name": "Rex", "type": "Dog", "age": "3"}"#,
            "--spec",
        ])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "method": "post",
            "url": "http://h/v1/pets",
            "body": {"name": "Rex", "type": "Dog", "age": 3}
        })
    );
}

#[test]
fn request_coercion_failure_exits_one() {
    embrasure()
        .args([
            "request",
            "--route",
            "create-pet",
            "--params",
            r#"{"name": "Rex"}"#,
            "--spec",
        ])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"))
        .stderr(contains("type, age"));
}

#[test]
fn request_invalid_params_json_exits_one() {
    embrasure()
        .args(["request", "--route", "list-pets", "--params", "{not json", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("--params"));
}

#[test]
fn request_non_object_params_exits_one() {
    embrasure()
        .args(["request", "--route", "list-pets", "--params", "[1, 2]", "--spec"])
        .arg(fixture("petstore-swagger.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2004"));
}

#[test]
fn request_reads_spec_from_any_path() {
    let tmp = TempDir::new().expect("temp dir");
    let spec = tmp.path().join("api.json");
    std::fs::write(
        &spec,
        r#"{
  "openapi": "3.0.0",
  "info": {"title": "t", "version": "1"},
  "paths": {
    "/ping": {"get": {"operationId": "ping", "responses": {}}}
  }
}"#,
    )
    .expect("write spec");

    let output = embrasure()
        .args(["request", "--route", "ping", "--spec"])
        .arg(&spec)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"method": "get", "url": "/ping"})
    );
}
