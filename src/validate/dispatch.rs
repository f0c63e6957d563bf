//! Validator dispatch
//!
//! Maps a fragment's keyword set to the ordered list of validator kinds that
//! apply to it. Runs once per node while the graph is built.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Keys that never count as unrecognized
pub const ALWAYS_IGNORED: [&str; 4] = ["description", "title", "$schema", "definitions"];

/// JSON type names understood by `type`
pub const KNOWN_TYPES: [&str; 7] = ["null", "boolean", "number", "integer", "string", "array", "object"];

/// Every validator variant, one per JSON Schema construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorKind {
    Object,
    Array,
    Number,
    Integer,
    String,
    Null,
    Boolean,
    Enum,
    MultiType,
    Ref,
    AnyOf,
    OneOf,
    AllOf,
    Not,
}

impl ValidatorKind {
    /// All kinds, in evaluation order
    pub const ALL: [ValidatorKind; 14] = [
        Self::Object,
        Self::Array,
        Self::Number,
        Self::Integer,
        Self::String,
        Self::Null,
        Self::Boolean,
        Self::Enum,
        Self::MultiType,
        Self::Ref,
        Self::AnyOf,
        Self::OneOf,
        Self::AllOf,
        Self::Not,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::MultiType => "multi-type",
            Self::Ref => "$ref",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::AllOf => "allOf",
            Self::Not => "not",
        }
    }

    /// Keywords this kind consumes when present
    pub fn recognized_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Object => &["type", "properties", "additionalProperties", "patternProperties", "required"],
            Self::Array => &["type", "items", "minItems", "maxItems", "numItems", "uniqueItems"],
            Self::Number | Self::Integer => &[
                "type",
                "minimum",
                "maximum",
                "exclusiveMinimum",
                "exclusiveMaximum",
                "multipleOf",
                "default",
            ],
            Self::String => &["type", "minLength", "maxLength", "pattern", "format", "default"],
            Self::Null => &["type"],
            Self::Boolean => &["type", "default"],
            Self::Enum => &["enum", "default"],
            // the per-type keys are added in `consumed_keys`
            Self::MultiType => &["type"],
            Self::Ref => &["$ref"],
            Self::AnyOf => &["anyOf"],
            Self::OneOf => &["oneOf"],
            Self::AllOf => &["allOf"],
            Self::Not => &["not"],
        }
    }

    /// Static applicability test against a fragment
    pub fn applies(&self, schema: &Map<String, Value>) -> bool {
        let type_name = schema.get("type").and_then(Value::as_str);
        match self {
            Self::Object => {
                type_name == Some("object")
                    || schema.contains_key("properties")
                    || schema.contains_key("additionalProperties")
            }
            Self::Array => type_name == Some("array") || schema.contains_key("items"),
            Self::Number => type_name == Some("number"),
            Self::Integer => type_name == Some("integer"),
            Self::String => type_name == Some("string"),
            Self::Null => type_name == Some("null"),
            Self::Boolean => type_name == Some("boolean"),
            Self::Enum => schema.contains_key("enum"),
            Self::MultiType => schema.get("type").map(Value::is_array).unwrap_or(false),
            Self::Ref => schema.contains_key("$ref"),
            Self::AnyOf => schema.contains_key("anyOf"),
            Self::OneOf => schema.contains_key("oneOf"),
            Self::AllOf => schema.contains_key("allOf"),
            Self::Not => schema.contains_key("not"),
        }
    }

    /// Single-type kind for a `type` name
    pub fn for_type(type_name: &str) -> Option<Self> {
        match type_name {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Keys of `schema` this kind consumes
    pub fn consumed_keys<'s>(&self, schema: &'s Map<String, Value>) -> Vec<&'s str> {
        let mut keys: Vec<&'s str> = schema
            .keys()
            .map(String::as_str)
            .filter(|k| self.recognized_keys().contains(k))
            .collect();

        if *self == Self::MultiType {
            let listed = schema.get("type").and_then(Value::as_array);
            for kind in listed.into_iter().flatten().filter_map(|t| t.as_str()).filter_map(Self::for_type) {
                for key in schema.keys().map(String::as_str) {
                    if kind.recognized_keys().contains(&key) && !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }

        keys
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ordered kinds applicable to a fragment
pub fn select(schema: &Map<String, Value>) -> Vec<ValidatorKind> {
    ValidatorKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.applies(schema))
        .collect()
}

/// Keys left over after every applicable kind took its share
pub fn unused_keys(schema: &Map<String, Value>, kinds: &[ValidatorKind], extra_ignored: &[String]) -> Vec<String> {
    let consumed: Vec<&str> = kinds.iter().flat_map(|k| k.consumed_keys(schema)).collect();
    schema
        .keys()
        .filter(|k| !ALWAYS_IGNORED.contains(&k.as_str()))
        .filter(|k| !extra_ignored.iter().any(|e| e == *k))
        .filter(|k| !consumed.contains(&k.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(schema: Value) -> Vec<ValidatorKind> {
        select(schema.as_object().unwrap())
    }

    #[test]
    fn test_simple_schemas() {
        use ValidatorKind::*;
        assert_eq!(kinds(json!({"type": "integer"})), vec![Integer]);
        assert_eq!(kinds(json!({"type": "number"})), vec![Number]);
        assert_eq!(kinds(json!({"type": "string"})), vec![String]);
        assert_eq!(kinds(json!({"type": "null"})), vec![Null]);
        assert_eq!(kinds(json!({"type": "array"})), vec![Array]);
        assert_eq!(kinds(json!({"type": "object"})), vec![Object]);
        assert_eq!(kinds(json!({"type": ["integer", "number", "string"]})), vec![MultiType]);
        assert_eq!(kinds(json!({"properties": {"foo": {"type": "string"}}})), vec![Object]);
        assert_eq!(kinds(json!({"additionalProperties": {"type": "string"}})), vec![Object]);
        assert_eq!(kinds(json!({"enum": ["hello"], "type": "string"})), vec![String, Enum]);
        assert_eq!(kinds(json!({"enum": [true], "type": "boolean"})), vec![Boolean, Enum]);
        assert_eq!(kinds(json!({"enum": ["hello", null, 2]})), vec![Enum]);
        assert_eq!(kinds(json!({"description": "foo"})), vec![]);
        assert_eq!(kinds(json!({})), vec![]);
        assert_eq!(kinds(json!({"$ref": "#/definitions/blah"})), vec![Ref]);
        assert_eq!(kinds(json!({"anyOf": [{"type": "integer"}]})), vec![AnyOf]);
        assert_eq!(kinds(json!({"not": {}, "allOf": [], "oneOf": []})), vec![OneOf, AllOf, Not]);
    }

    #[test]
    fn test_unused_keys_respects_ignored_set() {
        let schema = json!({
            "type": "string",
            "title": "t",
            "description": "d",
            "$schema": "http://json-schema.org/draft-04/schema#",
            "definitions": {},
            "bogus": 1,
            "id": "x"
        });
        let map = schema.as_object().unwrap();
        let selected = select(map);
        assert_eq!(unused_keys(map, &selected, &[]), vec!["bogus", "id"]);
        assert_eq!(unused_keys(map, &selected, &["id".to_string()]), vec!["bogus"]);
    }

    #[test]
    fn test_multi_type_consumes_keys_of_listed_types() {
        let schema = json!({"type": ["string", "null"], "maxLength": 3, "minimum": 1});
        let map = schema.as_object().unwrap();
        let selected = select(map);
        assert_eq!(unused_keys(map, &selected, &[]), vec!["minimum"]);
    }

    #[test]
    fn test_every_kind_recognizes_its_trigger() {
        for kind in ValidatorKind::ALL {
            let keys = kind.recognized_keys();
            assert!(!keys.is_empty(), "{} recognizes nothing", kind);
        }
    }
}
