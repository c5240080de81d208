//! Compilation and request-building benchmarks.
//!
//! Run with: cargo bench -p embrasure

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};

use embrasure::{parse_spec, ApiSpec, CompileOptions, Registry};

/// A Swagger 2.0 document with `resource_count` CRUD resources.
fn generate_spec(resource_count: usize) -> ApiSpec {
    let mut paths = Map::new();
    for i in 0..resource_count {
        let resource = format!("resource{}", i);
        paths.insert(
            format!("/{}", resource),
            json!({
                "get": {
                    "operationId": format!("List{}", i),
                    "parameters": [
                        {"name": "limit", "in": "query", "type": "integer", "default": 20},
                        {"name": "cursor", "in": "query", "type": "string"}
                    ],
                    "responses": {}
                },
                "post": {
                    "operationId": format!("Create{}", i),
                    "parameters": [
                        {"name": "item", "in": "body", "required": true,
                         "schema": {"$ref": "#/definitions/Item"}},
                        {"name": "X-Request-ID", "in": "header", "type": "string"}
                    ],
                    "responses": {}
                }
            }),
        );
        paths.insert(
            format!("/{}/{{id}}", resource),
            json!({
                "get": {
                    "operationId": format!("Get{}", i),
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "type": "integer"}
                    ],
                    "responses": {}
                }
            }),
        );
    }

    let doc = json!({
        "swagger": "2.0",
        "info": {"title": "bench", "version": "1"},
        "basePath": "/v1",
        "paths": Value::Object(paths),
        "definitions": {
            "Item": {
                "type": "object",
                "required": ["name", "count"],
                "properties": {
                    "name": {"type": "string"},
                    "count": {"type": "integer"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            }
        }
    });
    parse_spec(&doc.to_string()).unwrap()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for resource_count in [1, 10, 50] {
        let spec = generate_spec(resource_count);
        group.bench_with_input(
            BenchmarkId::new("operations", resource_count * 3),
            &spec,
            |b, spec| {
                b.iter(|| {
                    black_box(embrasure::compile(spec, &CompileOptions::default()).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_request_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_for");

    let registry = Registry::builder()
        .base_url("https://api.example.com")
        .build_from_spec(&generate_spec(10))
        .unwrap();

    let path_params = json!({"id": "42"});
    group.bench_function("path_param", |b| {
        b.iter(|| black_box(registry.request_for("get5", black_box(&path_params)).unwrap()));
    });

    let query_params = json!({"limit": "50"});
    group.bench_function("query_with_defaults", |b| {
        b.iter(|| black_box(registry.request_for("list5", black_box(&query_params)).unwrap()));
    });

    let body = json!({"name": "widget", "count": "3", "tags": "a", "X-Request-ID": "abc"});
    group.bench_function("flat_body_and_header", |b| {
        b.iter(|| black_box(registry.request_for("create5", black_box(&body)).unwrap()));
    });

    group.bench_function("url_only", |b| {
        b.iter(|| black_box(registry.url_for("get5", black_box(&path_params)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_request_for);
criterion_main!(benches);
