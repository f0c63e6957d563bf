//! Scalar rules: numbers, integers and strings

use regex::Regex;
use serde_json::{Map, Value};

use super::{count_keyword, mismatch, number_keyword, InstancePath, Outcome};
use crate::error::{Result, SchemaError};
use crate::graph::NodeId;

/// `format` values defined by draft-04, plus `regex` which its meta-schema uses
pub const KNOWN_FORMATS: [&str; 7] = ["date-time", "email", "hostname", "ipv4", "ipv6", "uri", "regex"];

/// Range constraints of a `number` or `integer` node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericRules {
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

impl NumericRules {
    pub fn compile(schema: &Map<String, Value>, location: &str, integer: bool) -> Result<Self> {
        let mut rules = Self {
            integer,
            minimum: number_keyword(schema, "minimum", location)?,
            maximum: number_keyword(schema, "maximum", location)?,
            multiple_of: number_keyword(schema, "multipleOf", location)?,
            ..Self::default()
        };

        // draft-04 writes `exclusiveMinimum: true` next to `minimum`;
        // later drafts give the bound itself
        match schema.get("exclusiveMinimum") {
            Some(Value::Bool(true)) => rules.exclusive_minimum = rules.minimum.take(),
            Some(Value::Bool(false)) | None => {}
            Some(_) => rules.exclusive_minimum = number_keyword(schema, "exclusiveMinimum", location)?,
        }
        match schema.get("exclusiveMaximum") {
            Some(Value::Bool(true)) => rules.exclusive_maximum = rules.maximum.take(),
            Some(Value::Bool(false)) | None => {}
            Some(_) => rules.exclusive_maximum = number_keyword(schema, "exclusiveMaximum", location)?,
        }

        if let Some(divisor) = rules.multiple_of {
            if divisor <= 0.0 {
                return Err(SchemaError::invalid(
                    location,
                    format!("`multipleOf` must be greater than 0, found {}", divisor),
                ));
            }
        }

        Ok(rules)
    }

    pub fn check(&self, node: NodeId, value: &Value, path: &InstancePath<'_>) -> Outcome {
        let Some(number) = value.as_f64() else {
            let expected = if self.integer { "expected an integer" } else { "expected a number" };
            return Err(mismatch("type", path, value, node, expected));
        };

        if self.integer && !is_integral(value) {
            return Err(mismatch("type", path, value, node, "expected an integer"));
        }

        if let Some(min) = self.minimum {
            if number < min {
                return Err(mismatch("minimum", path, value, node, format!("less than minimum={}", min)));
            }
        }
        if let Some(max) = self.maximum {
            if number > max {
                return Err(mismatch("maximum", path, value, node, format!("greater than maximum={}", max)));
            }
        }
        if let Some(min) = self.exclusive_minimum {
            if number <= min {
                return Err(mismatch(
                    "exclusiveMinimum",
                    path,
                    value,
                    node,
                    format!("not greater than exclusive minimum {}", min),
                ));
            }
        }
        if let Some(max) = self.exclusive_maximum {
            if number >= max {
                return Err(mismatch(
                    "exclusiveMaximum",
                    path,
                    value,
                    node,
                    format!("not less than exclusive maximum {}", max),
                ));
            }
        }
        if let Some(divisor) = self.multiple_of {
            if !is_multiple(value, number, divisor) {
                return Err(mismatch(
                    "multipleOf",
                    path,
                    value,
                    node,
                    format!("not a multiple of {}", divisor),
                ));
            }
        }

        Ok(())
    }
}

fn is_integral(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.as_f64().map(|f| f.is_finite() && f.fract() == 0.0).unwrap_or(false)
}

fn is_multiple(value: &Value, number: f64, divisor: f64) -> bool {
    if divisor.fract() == 0.0 {
        if let Some(n) = value.as_i64() {
            return n % (divisor as i64) == 0;
        }
    }
    let quotient = number / divisor;
    (quotient - quotient.round()).abs() < 1e-9
}

/// How a node's `format` keyword behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatRule {
    /// Draft-04 format, accepted without checking
    Known(String),
    /// Anything else; every string is rejected
    Unknown(String),
}

/// Constraints of a `string` node
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub format: Option<FormatRule>,
}

impl StringRules {
    pub fn compile(schema: &Map<String, Value>, location: &str) -> Result<Self> {
        let pattern = match schema.get("pattern") {
            None => None,
            Some(Value::String(source)) => Some(Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
                pattern: source.clone(),
                location: location.to_string(),
                source: e,
            })?),
            Some(other) => {
                return Err(SchemaError::invalid(location, format!("`pattern` must be a string, found {}", other)))
            }
        };

        let format = match schema.get("format") {
            None => None,
            Some(Value::String(name)) if KNOWN_FORMATS.contains(&name.as_str()) => Some(FormatRule::Known(name.clone())),
            Some(Value::String(name)) => Some(FormatRule::Unknown(name.clone())),
            Some(other) => {
                return Err(SchemaError::invalid(location, format!("`format` must be a string, found {}", other)))
            }
        };

        Ok(Self {
            min_length: count_keyword(schema, "minLength", location)?,
            max_length: count_keyword(schema, "maxLength", location)?,
            pattern,
            format,
        })
    }

    pub fn check(&self, node: NodeId, value: &Value, path: &InstancePath<'_>) -> Outcome {
        let Value::String(text) = value else {
            return Err(mismatch("type", path, value, node, "expected a string"));
        };

        let length = text.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Err(mismatch("minLength", path, value, node, format!("shorter than minLength={}", min)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(mismatch("maxLength", path, value, node, format!("longer than maxLength={}", max)));
            }
        }
        if let Some(pattern) = &self.pattern {
            // must match at the start of the string; the end is free
            if !pattern.find(text).is_some_and(|m| m.start() == 0) {
                return Err(mismatch(
                    "pattern",
                    path,
                    value,
                    node,
                    format!("does not match pattern {}", pattern.as_str()),
                ));
            }
        }
        if let Some(FormatRule::Unknown(name)) = &self.format {
            return Err(mismatch("format", path, value, node, format!("format '{}' not recognized", name)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numeric(schema: Value, integer: bool) -> NumericRules {
        NumericRules::compile(schema.as_object().unwrap(), "#", integer).unwrap()
    }

    fn strings(schema: Value) -> StringRules {
        StringRules::compile(schema.as_object().unwrap(), "#").unwrap()
    }

    fn ok(result: Outcome) -> bool {
        result.is_ok()
    }

    #[test]
    fn test_number_bounds() {
        let rules = numeric(json!({"type": "number", "minimum": 0, "maximum": 10}), false);
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        assert!(ok(rules.check(node, &json!(0), &root)));
        assert!(ok(rules.check(node, &json!(10.0), &root)));
        assert!(ok(rules.check(node, &json!(2.5), &root)));
        assert_eq!(rules.check(node, &json!(-1), &root).unwrap_err().keyword(), Some("minimum"));
        assert_eq!(rules.check(node, &json!(11), &root).unwrap_err().keyword(), Some("maximum"));
        assert_eq!(rules.check(node, &json!(true), &root).unwrap_err().keyword(), Some("type"));
        assert_eq!(rules.check(node, &json!("1"), &root).unwrap_err().keyword(), Some("type"));
    }

    #[test]
    fn test_exclusive_bounds_numeric_and_boolean_forms() {
        let root = InstancePath::Root;
        let node = NodeId::new(0);

        let numeric_form = numeric(json!({"exclusiveMinimum": 0, "exclusiveMaximum": 5}), false);
        assert!(numeric_form.check(node, &json!(0), &root).is_err());
        assert!(numeric_form.check(node, &json!(5), &root).is_err());
        assert!(ok(numeric_form.check(node, &json!(0.5), &root)));

        let boolean_form = numeric(json!({"minimum": 0, "exclusiveMinimum": true, "maximum": 5}), false);
        assert_eq!(
            boolean_form.check(node, &json!(0), &root).unwrap_err().keyword(),
            Some("exclusiveMinimum")
        );
        assert!(ok(boolean_form.check(node, &json!(5), &root)));

        let disabled = numeric(json!({"minimum": 0, "exclusiveMinimum": false}), false);
        assert!(ok(disabled.check(node, &json!(0), &root)));
    }

    #[test]
    fn test_integer_accepts_integral_floats() {
        let rules = numeric(json!({"type": "integer"}), true);
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        assert!(ok(rules.check(node, &json!(2), &root)));
        assert!(ok(rules.check(node, &json!(2.0), &root)));
        assert!(ok(rules.check(node, &json!(-7), &root)));
        assert!(rules.check(node, &json!(2.5), &root).is_err());
        assert!(rules.check(node, &json!(false), &root).is_err());
    }

    #[test]
    fn test_multiple_of() {
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        let whole = numeric(json!({"multipleOf": 3}), true);
        assert!(ok(whole.check(node, &json!(9), &root)));
        assert!(whole.check(node, &json!(10), &root).is_err());

        let fractional = numeric(json!({"multipleOf": 0.1}), false);
        assert!(ok(fractional.check(node, &json!(0.3), &root)));
        assert!(fractional.check(node, &json!(0.35), &root).is_err());

        let zero = json!({"multipleOf": 0});
        assert!(NumericRules::compile(zero.as_object().unwrap(), "#", false).is_err());
    }

    #[test]
    fn test_string_lengths_count_characters() {
        let rules = strings(json!({"minLength": 2, "maxLength": 3}));
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        assert!(ok(rules.check(node, &json!("héé"), &root)));
        assert_eq!(rules.check(node, &json!("é"), &root).unwrap_err().keyword(), Some("minLength"));
        assert_eq!(rules.check(node, &json!("abcd"), &root).unwrap_err().keyword(), Some("maxLength"));
        assert_eq!(rules.check(node, &json!(3), &root).unwrap_err().keyword(), Some("type"));
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let rules = strings(json!({"pattern": "b+"}));
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        assert!(ok(rules.check(node, &json!("bbc"), &root)));
        assert_eq!(rules.check(node, &json!("abbc"), &root).unwrap_err().keyword(), Some("pattern"));
        assert!(rules.check(node, &json!("ac"), &root).is_err());

        let alternation = strings(json!({"pattern": "x|b"}));
        assert!(ok(alternation.check(node, &json!("bx"), &root)));
        assert!(alternation.check(node, &json!("ab"), &root).is_err());

        let anchored = strings(json!({"pattern": "^[a-z]+$"}));
        assert!(anchored.check(node, &json!("abc1"), &root).is_err());
    }

    #[test]
    fn test_invalid_pattern_fails_compile() {
        let schema = json!({"pattern": "(unclosed"});
        match StringRules::compile(schema.as_object().unwrap(), "#/properties/a") {
            Err(SchemaError::InvalidPattern { pattern, location, .. }) => {
                assert_eq!(pattern, "(unclosed");
                assert_eq!(location, "#/properties/a");
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_formats() {
        let root = InstancePath::Root;
        let node = NodeId::new(0);
        let known = strings(json!({"format": "email"}));
        assert_eq!(known.format, Some(FormatRule::Known("email".to_string())));
        assert!(ok(known.check(node, &json!("not an email"), &root)));

        let unknown = strings(json!({"format": "color"}));
        assert_eq!(unknown.check(node, &json!("red"), &root).unwrap_err().keyword(), Some("format"));
    }
}
