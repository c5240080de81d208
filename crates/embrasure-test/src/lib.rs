//! Test harnesses for Embrasure.
//!
//! Provides helpers for loading the shared fixtures under `tests/fixtures`
//! and the CLI regression suite for the `embrasure` binary.

use std::path::PathBuf;

use embrasure::{parse_route_table, CompileError, Registry};
use thiserror::Error;

#[cfg(test)]
mod cli;
#[cfg(test)]
mod fixtures;

/// Errors raised while loading a fixture.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile fixture: {0}")]
    Compile(#[from] CompileError),
}

/// Absolute path to the shared test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/embrasure-test
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .map(|root| root.join("tests/fixtures"))
        .unwrap_or_else(|| manifest.join("tests/fixtures"))
}

/// Absolute path to one fixture file.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Read a fixture file as text.
pub fn read_fixture(name: &str) -> Result<String, TestError> {
    let path = fixture(name);
    std::fs::read_to_string(&path).map_err(|source| TestError::Read { path, source })
}

/// Compile a Swagger/OpenAPI fixture into a registry.
pub fn registry_from_fixture(name: &str, base_url: Option<&str>) -> Result<Registry, TestError> {
    let content = read_fixture(name)?;
    Ok(Registry::from_spec_str(&content, base_url)?)
}

/// Compile a route-table fixture into a registry.
pub fn registry_from_route_table(name: &str, base_url: &str) -> Result<Registry, TestError> {
    let content = read_fixture(name)?;
    let routes = parse_route_table(&content)?;
    Ok(Registry::from_routes(routes, base_url)?)
}
