//! Name normalization.
//!
//! Route names and parameter names are exposed as lowercase-hyphenated
//! identifiers: `GetPet` → `get-pet`, `first_name` → `first-name`,
//! `X-Request-ID` → `x-request-id`.

use heck::ToKebabCase;

/// Normalize an identifier to its lowercase-hyphenated form.
///
/// Word boundaries fall at case changes, at the end of an acronym
/// (`HTTPServer` → `http-server`), after a digit followed by an uppercase
/// letter, and at any non-alphanumeric character.
pub fn normalize_key(name: &str) -> String {
    name.to_kebab_case()
}
