//! Path template tokenizer.

use std::collections::HashSet;

use crate::error::CompileError;
use crate::route::{PathTemplate, PathToken};

/// Split a URL template into literal and parameter tokens.
///
/// Parameters are written `{name}`, or `:name` at the start of a path
/// segment (running to the next `/`). Nested, unbalanced or empty braces,
/// names containing whitespace and repeated parameter names are rejected.
pub fn tokenize(template: &str) -> Result<PathTemplate, CompileError> {
    let invalid = |reason: String| {
        CompileError::InvalidPathTemplate(format!("{} - {}", template, reason))
    };

    let mut tokens = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();
    let mut segment_start = true;

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(invalid("nested braces not allowed".into())),
                        Some('/') | None => return Err(invalid("unclosed brace".into())),
                        Some(c) => name.push(c),
                    }
                }
                if name.is_empty() {
                    return Err(invalid("empty parameter name".into()));
                }
                if name.contains(char::is_whitespace) {
                    return Err(invalid(format!("whitespace in parameter name '{}'", name)));
                }
                if !seen.insert(name.clone()) {
                    return Err(invalid(format!("duplicate parameter '{}'", name)));
                }
                tokens.push(PathToken::Literal(std::mem::take(&mut literal)));
                tokens.push(PathToken::Param { param: name });
                segment_start = false;
            }
            '}' => return Err(invalid("unmatched closing brace".into())),
            ':' if segment_start => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if matches!(c, '/' | '{' | '}') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(invalid("empty parameter name".into()));
                }
                if name.contains(char::is_whitespace) {
                    return Err(invalid(format!("whitespace in parameter name '{}'", name)));
                }
                if !seen.insert(name.clone()) {
                    return Err(invalid(format!("duplicate parameter '{}'", name)));
                }
                tokens.push(PathToken::Literal(std::mem::take(&mut literal)));
                tokens.push(PathToken::Param { param: name });
                segment_start = false;
            }
            _ => {
                segment_start = ch == '/';
                literal.push(ch);
            }
        }
    }
    tokens.push(PathToken::Literal(literal));

    Ok(PathTemplate::from_tokens(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(template: &str) {
        assert_eq!(tokenize(template).unwrap().to_string(), template);
    }

    #[test]
    fn literal_only() {
        let t = tokenize("/pets").unwrap();
        assert_eq!(t.tokens(), &[PathToken::literal("/pets")]);
    }

    #[test]
    fn single_param() {
        let t = tokenize("/pets/{id}").unwrap();
        assert_eq!(
            t.tokens(),
            &[PathToken::literal("/pets/"), PathToken::param("id")]
        );
    }

    #[test]
    fn params_inside_segments() {
        let t = tokenize("/files/{name}.{ext}/raw").unwrap();
        assert_eq!(t.params().collect::<Vec<_>>(), vec!["name", "ext"]);
        assert_eq!(
            t.tokens(),
            &[
                PathToken::literal("/files/"),
                PathToken::param("name"),
                PathToken::literal("."),
                PathToken::param("ext"),
                PathToken::literal("/raw"),
            ]
        );
    }

    #[test]
    fn brace_templates_round_trip() {
        for template in [
            "",
            "/",
            "/pets",
            "/pets/{id}",
            "{tenant}/pets",
            "/users/{userId}/pets/{petId}/toys",
            "/files/{name}.{ext}",
            "/v1/pets:batchGet",
        ] {
            round_trip(template);
        }
    }

    #[test]
    fn colon_params() {
        let t = tokenize("/pets/:id/toys/:toy_id").unwrap();
        assert_eq!(t.to_string(), "/pets/{id}/toys/{toy_id}");

        // Only at the start of a segment.
        let t = tokenize("/v1/pets:batchGet").unwrap();
        assert_eq!(t.params().count(), 0);
    }

    #[test]
    fn rejects_malformed_templates() {
        let cases = [
            ("/pets/{id", "unclosed brace"),
            ("/pets/{id/toys", "unclosed brace"),
            ("/pets/id}", "unmatched closing brace"),
            ("/pets/{{id}}", "nested braces"),
            ("/pets/{}", "empty parameter name"),
            ("/pets/{ }", "whitespace in parameter name"),
            ("/a/{ id }", "whitespace in parameter name ' id '"),
            ("/a/:pet id", "whitespace in parameter name 'pet id'"),
            ("/pets/:", "empty parameter name"),
            ("/a/{id}/b/{id}", "duplicate parameter 'id'"),
        ];
        for (template, reason) in cases {
            let err = tokenize(template).unwrap_err();
            let message = err.to_string();
            assert!(
                matches!(err, CompileError::InvalidPathTemplate(_)),
                "{}",
                template
            );
            assert!(message.contains(template), "{}", message);
            assert!(message.contains(reason), "{}", message);
        }
    }
}
