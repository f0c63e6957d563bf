//! Validation
//!
//! Every node carries the validators its fragment selected at build time
//! ([`dispatch::select`]). Validating a value runs them in order; the first
//! failure is returned. Composite validators recurse through
//! [`Validation::check`] with the child's [`NodeId`], so a recursive schema
//! is walked along the data, never expanded.

pub mod combinator;
pub mod container;
pub mod dispatch;
pub mod path;
pub mod scalar;

pub use combinator::{values_equal, RefTarget, TypeUnion};
pub use container::{Additional, ArrayRules, Items, ObjectRules};
pub use dispatch::ValidatorKind;
pub use path::InstancePath;
pub use scalar::{FormatRule, NumericRules, StringRules, KNOWN_FORMATS};

use serde_json::{Map, Value};

use crate::config::ValidationConfig;
use crate::error::{preview, Result, SchemaError, ValidationError};
use crate::graph::{NodeId, SchemaGraph};

/// Validation outcome of a single node or validator
pub type Outcome = std::result::Result<(), ValidationError>;

/// A compiled validator bound to one node
#[derive(Debug, Clone)]
pub enum Validator {
    Object(ObjectRules),
    Array(ArrayRules),
    Number(NumericRules),
    Integer(NumericRules),
    String(StringRules),
    Null,
    Boolean,
    Enum(Vec<Value>),
    MultiType(TypeUnion),
    Ref(RefTarget),
    AnyOf(Vec<NodeId>),
    OneOf(Vec<NodeId>),
    AllOf(Vec<NodeId>),
    Not(NodeId),
}

impl Validator {
    pub fn kind(&self) -> ValidatorKind {
        match self {
            Self::Object(_) => ValidatorKind::Object,
            Self::Array(_) => ValidatorKind::Array,
            Self::Number(_) => ValidatorKind::Number,
            Self::Integer(_) => ValidatorKind::Integer,
            Self::String(_) => ValidatorKind::String,
            Self::Null => ValidatorKind::Null,
            Self::Boolean => ValidatorKind::Boolean,
            Self::Enum(_) => ValidatorKind::Enum,
            Self::MultiType(_) => ValidatorKind::MultiType,
            Self::Ref(_) => ValidatorKind::Ref,
            Self::AnyOf(_) => ValidatorKind::AnyOf,
            Self::OneOf(_) => ValidatorKind::OneOf,
            Self::AllOf(_) => ValidatorKind::AllOf,
            Self::Not(_) => ValidatorKind::Not,
        }
    }

    /// Check `value` against this validator of node `node`
    pub fn check(
        &self,
        cx: &Validation<'_>,
        node: NodeId,
        value: &Value,
        path: &InstancePath<'_>,
        depth: usize,
    ) -> Outcome {
        match self {
            Self::Object(rules) => rules.check(cx, node, value, path, depth),
            Self::Array(rules) => rules.check(cx, node, value, path, depth),
            Self::Number(rules) | Self::Integer(rules) => rules.check(node, value, path),
            Self::String(rules) => rules.check(node, value, path),
            Self::Null => match value {
                Value::Null => Ok(()),
                _ => Err(mismatch("type", path, value, node, "expected null")),
            },
            Self::Boolean => match value {
                Value::Bool(_) => Ok(()),
                _ => Err(mismatch("type", path, value, node, "expected a boolean")),
            },
            Self::Enum(literals) => combinator::check_enum(cx, literals, node, value, path),
            Self::MultiType(union) => union.check(cx, node, value, path, depth),
            Self::Ref(target) => target.check(cx, value, path, depth),
            Self::AnyOf(branches) => combinator::check_any_of(cx, branches, node, value, path, depth),
            Self::OneOf(branches) => combinator::check_one_of(cx, branches, node, value, path, depth),
            Self::AllOf(branches) => combinator::check_all_of(cx, branches, value, path, depth),
            Self::Not(inner) => combinator::check_not(cx, *inner, node, value, path, depth),
        }
    }
}

/// Borrowed validation context: the graph plus the policy knobs
pub struct Validation<'g> {
    pub(crate) graph: &'g SchemaGraph,
    pub(crate) config: &'g ValidationConfig,
}

impl<'g> Validation<'g> {
    pub fn new(graph: &'g SchemaGraph, config: &'g ValidationConfig) -> Self {
        Self { graph, config }
    }

    /// Run every validator of `id` against `value`; first failure wins
    pub fn check(&self, id: NodeId, value: &Value, path: &InstancePath<'_>, depth: usize) -> Outcome {
        if depth > self.config.max_depth {
            return Err(ValidationError::DepthExceeded {
                limit: self.config.max_depth,
                instance_path: path.to_pointer(),
            });
        }

        for validator in self.graph.node(id).validators() {
            validator.check(self, id, value, path, depth)?;
        }
        Ok(())
    }
}

pub(crate) fn mismatch(
    keyword: &'static str,
    path: &InstancePath<'_>,
    value: &Value,
    node: NodeId,
    message: impl Into<String>,
) -> ValidationError {
    ValidationError::Mismatch {
        keyword,
        instance_path: path.to_pointer(),
        value: preview(value),
        node,
        message: message.into(),
    }
}

// ========== Keyword readers shared by the rule compilers ==========

pub(crate) fn number_keyword(schema: &Map<String, Value>, key: &str, location: &str) -> Result<Option<f64>> {
    match schema.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| SchemaError::invalid(location, format!("`{}` must be a number, found {}", key, value))),
    }
}

pub(crate) fn count_keyword(schema: &Map<String, Value>, key: &str, location: &str) -> Result<Option<usize>> {
    match schema.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                SchemaError::invalid(location, format!("`{}` must be a non-negative integer, found {}", key, value))
            }),
    }
}

pub(crate) fn bool_keyword(schema: &Map<String, Value>, key: &str, location: &str) -> Result<bool> {
    match schema.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(value) => Err(SchemaError::invalid(
            location,
            format!("`{}` must be a boolean, found {}", key, value),
        )),
    }
}
