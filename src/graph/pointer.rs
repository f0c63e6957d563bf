//! Local `$ref` pointers
//!
//! Only same-document pointers are supported: `#` followed by `/`-separated
//! segments, each looked up as an object key (or an array index) starting
//! from the document root. Segments are unescaped per RFC 6901.

use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Split a `#/a/b` pointer into unescaped segments
pub fn segments(pointer: &str) -> Result<Vec<String>> {
    let Some(rest) = pointer.strip_prefix('#') else {
        return Err(SchemaError::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: "only local references starting with '#' are supported".to_string(),
        });
    };

    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let Some(rest) = rest.strip_prefix('/') else {
        return Err(SchemaError::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: "expected '/' after '#'".to_string(),
        });
    };

    Ok(rest.split('/').map(unescape).collect())
}

/// Walk `pointer` against `document`
pub fn resolve<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value> {
    let mut current = document;
    for segment in segments(pointer)? {
        let next = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| SchemaError::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: format!("segment '{}' not present in the schema", segment),
        })?;
    }
    Ok(current)
}

/// Escape a key for use as a pointer segment
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
