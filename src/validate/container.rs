//! Container rules: arrays and objects
//!
//! Child schemas are interned by the builder; the rules only hold their ids.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{bool_keyword, count_keyword, mismatch, values_equal, InstancePath, Outcome, Validation};
use crate::config::EnumEquality;
use crate::error::{Result, SchemaError, ValidationError};
use crate::graph::NodeId;

/// Shape of an `items` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Items {
    /// One schema applied to every element
    Schema(NodeId),
    /// Positional schemas; counted but never checked
    Tuple(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayRules {
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub num_items: Option<usize>,
    pub unique_items: bool,
    pub items: Option<Items>,
}

impl ArrayRules {
    pub fn compile(schema: &Map<String, Value>, location: &str, items: Option<Items>) -> Result<Self> {
        Ok(Self {
            min_items: count_keyword(schema, "minItems", location)?,
            max_items: count_keyword(schema, "maxItems", location)?,
            num_items: count_keyword(schema, "numItems", location)?,
            unique_items: bool_keyword(schema, "uniqueItems", location)?,
            items,
        })
    }

    pub fn check(
        &self,
        cx: &Validation<'_>,
        node: NodeId,
        value: &Value,
        path: &InstancePath<'_>,
        depth: usize,
    ) -> Outcome {
        let Value::Array(elements) = value else {
            return Err(mismatch("type", path, value, node, "expected an array"));
        };

        let len = elements.len();
        if let Some(min) = self.min_items {
            if len < min {
                return Err(mismatch("minItems", path, value, node, format!("fewer than minItems={}", min)));
            }
        }
        if let Some(max) = self.max_items {
            if len > max {
                return Err(mismatch("maxItems", path, value, node, format!("more than maxItems={}", max)));
            }
        }
        if let Some(count) = self.num_items {
            if len != count {
                return Err(mismatch("numItems", path, value, node, format!("expected exactly {} items", count)));
            }
        }
        if self.unique_items {
            for (i, a) in elements.iter().enumerate() {
                if let Some(j) = elements[i + 1..]
                    .iter()
                    .position(|b| values_equal(a, b, EnumEquality::Strict))
                {
                    return Err(mismatch(
                        "uniqueItems",
                        path,
                        value,
                        node,
                        format!("items {} and {} are equal", i, i + 1 + j),
                    ));
                }
            }
        }

        match self.items {
            None => Ok(()),
            Some(Items::Tuple(_)) => Err(ValidationError::NotImplemented {
                construct: "tuple items",
                node,
            }),
            Some(Items::Schema(child)) => {
                for (i, element) in elements.iter().enumerate() {
                    cx.check(child, element, &path.index(i), depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// What happens to keys not listed in `properties`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Additional {
    #[default]
    Allowed,
    Forbidden,
    Schema(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRules {
    pub type_is_object: bool,
    pub properties: BTreeMap<String, NodeId>,
    pub additional: Additional,
    pub required: Vec<String>,
    pub has_pattern_properties: bool,
}

impl ObjectRules {
    pub fn compile(
        schema: &Map<String, Value>,
        location: &str,
        properties: BTreeMap<String, NodeId>,
        additional: Additional,
    ) -> Result<Self> {
        let required = match schema.get("required") {
            None => Vec::new(),
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|k| {
                    k.as_str().map(str::to_string).ok_or_else(|| {
                        SchemaError::invalid(location, format!("`required` entries must be strings, found {}", k))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(SchemaError::invalid(
                    location,
                    format!("`required` must be an array, found {}", other),
                ))
            }
        };

        let has_pattern_properties = match schema.get("patternProperties") {
            None => false,
            Some(Value::Object(patterns)) => !patterns.is_empty(),
            Some(other) => {
                return Err(SchemaError::invalid(
                    location,
                    format!("`patternProperties` must be an object, found {}", other),
                ))
            }
        };

        Ok(Self {
            type_is_object: schema.get("type").and_then(Value::as_str) == Some("object"),
            properties,
            additional,
            required,
            has_pattern_properties,
        })
    }

    pub fn check(
        &self,
        cx: &Validation<'_>,
        node: NodeId,
        value: &Value,
        path: &InstancePath<'_>,
        depth: usize,
    ) -> Outcome {
        let Value::Object(object) = value else {
            if self.type_is_object {
                return Err(mismatch("type", path, value, node, "expected an object"));
            }
            if !self.required.is_empty() {
                return Err(mismatch(
                    "required",
                    path,
                    value,
                    node,
                    format!("missing properties {:?}", self.required),
                ));
            }
            return Ok(());
        };

        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|k| !object.contains_key(k.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(mismatch(
                "required",
                path,
                value,
                node,
                format!("missing required keys {:?}", missing),
            ));
        }

        for (key, property) in object {
            if let Some(&child) = self.properties.get(key) {
                cx.check(child, property, &path.key(key), depth + 1)?;
                continue;
            }
            if self.has_pattern_properties {
                return Err(ValidationError::NotImplemented {
                    construct: "patternProperties",
                    node,
                });
            }
            match self.additional {
                Additional::Allowed => {}
                Additional::Forbidden => {
                    return Err(mismatch(
                        "additionalProperties",
                        path,
                        value,
                        node,
                        format!("property '{}' is not allowed", key),
                    ))
                }
                Additional::Schema(child) => cx.check(child, property, &path.key(key), depth + 1)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ValidationError;
    use crate::SchemaGraph;
    use serde_json::json;

    #[test]
    fn test_required_and_properties() {
        let graph = SchemaGraph::build(json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}},
            "required": ["a"]
        }))
        .unwrap();

        assert!(graph.validate(&json!({"a": 1})).is_ok());
        assert_eq!(graph.validate(&json!({})).unwrap_err().keyword(), Some("required"));
        match graph.validate(&json!({"a": "x"})).unwrap_err() {
            ValidationError::Mismatch { keyword, instance_path, .. } => {
                assert_eq!(keyword, "type");
                assert_eq!(instance_path, "/a");
            }
            other => panic!("Expected Mismatch, got {:?}", other),
        }
        assert_eq!(graph.validate(&json!(3)).unwrap_err().keyword(), Some("type"));
    }

    #[test]
    fn test_untyped_object_rules_let_scalars_through() {
        let graph = SchemaGraph::build(json!({"properties": {"a": {"type": "integer"}}})).unwrap();
        assert!(graph.validate(&json!("not an object")).is_ok());
        assert!(graph.validate(&json!(null)).is_ok());

        let graph = SchemaGraph::build(json!({"properties": {}, "required": ["a"]})).unwrap();
        assert_eq!(graph.validate(&json!(5)).unwrap_err().keyword(), Some("required"));
    }

    #[test]
    fn test_additional_properties() {
        let closed = SchemaGraph::build(json!({
            "properties": {"a": {}},
            "additionalProperties": false
        }))
        .unwrap();
        assert!(closed.validate(&json!({"a": 1})).is_ok());
        let err = closed.validate(&json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(err.keyword(), Some("additionalProperties"));
        assert!(err.to_string().contains("'b'"));

        let typed = SchemaGraph::build(json!({"additionalProperties": {"type": "string"}})).unwrap();
        assert!(typed.validate(&json!({"x": "y"})).is_ok());
        assert!(typed.validate(&json!({"x": 1})).is_err());
    }

    #[test]
    fn test_pattern_properties_only_raise_for_uncovered_keys() {
        let graph = SchemaGraph::build(json!({
            "properties": {"a": {"type": "integer"}},
            "patternProperties": {"^x-": {"type": "string"}}
        }))
        .unwrap();

        assert!(graph.validate(&json!({"a": 1})).is_ok());
        assert!(matches!(
            graph.validate(&json!({"a": 1, "x-b": "c"})),
            Err(ValidationError::NotImplemented { construct: "patternProperties", .. })
        ));
    }

    #[test]
    fn test_array_counts_and_items() {
        let graph = SchemaGraph::build(json!({
            "type": "array",
            "items": {"type": "integer"},
            "minItems": 1,
            "maxItems": 3
        }))
        .unwrap();

        assert!(graph.validate(&json!([1, 2])).is_ok());
        assert_eq!(graph.validate(&json!([])).unwrap_err().keyword(), Some("minItems"));
        assert_eq!(graph.validate(&json!([1, 2, 3, 4])).unwrap_err().keyword(), Some("maxItems"));
        match graph.validate(&json!([1, "two"])).unwrap_err() {
            ValidationError::Mismatch { instance_path, .. } => assert_eq!(instance_path, "/1"),
            other => panic!("Expected Mismatch, got {:?}", other),
        }
        assert_eq!(graph.validate(&json!({})).unwrap_err().keyword(), Some("type"));
    }

    #[test]
    fn test_untyped_items_reject_non_arrays() {
        let graph = SchemaGraph::build(json!({"items": {"type": "integer"}})).unwrap();
        assert!(graph.validate(&json!([1, 2])).is_ok());
        assert_eq!(graph.validate(&json!("abc")).unwrap_err().keyword(), Some("type"));
        assert_eq!(graph.validate(&json!(5)).unwrap_err().keyword(), Some("type"));
        assert!(graph.validate(&json!(["abc"])).is_err());
    }

    #[test]
    fn test_num_items_and_unique_items() {
        let graph = SchemaGraph::build(json!({"type": "array", "numItems": 2, "uniqueItems": true})).unwrap();
        assert!(graph.validate(&json!([1, 2])).is_ok());
        assert_eq!(graph.validate(&json!([1])).unwrap_err().keyword(), Some("numItems"));
        assert_eq!(graph.validate(&json!([1, 1.0])).unwrap_err().keyword(), Some("uniqueItems"));
        assert!(graph.validate(&json!([1, true])).is_ok());
    }

    #[test]
    fn test_tuple_items_not_implemented() {
        let graph = SchemaGraph::build(json!({"items": [{"type": "integer"}, {"type": "string"}]})).unwrap();
        assert!(matches!(
            graph.validate(&json!([1, "a"])),
            Err(ValidationError::NotImplemented { construct: "tuple items", .. })
        ));
        assert_eq!(graph.validate(&json!("not an array")).unwrap_err().keyword(), Some("type"));
    }
}
