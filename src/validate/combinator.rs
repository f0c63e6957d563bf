//! Enum, type unions, references and the boolean combinators
//!
//! Branches only absorb [`ValidationError::Mismatch`]. Anything else
//! describes the schema or the engine and propagates unchanged.

use serde_json::Value;

use super::{mismatch, InstancePath, Outcome, Validation};
use crate::config::EnumEquality;
use crate::error::ValidationError;
use crate::graph::NodeId;

/// JSON equality with numeric comparison of numbers.
///
/// Under [`EnumEquality::Loose`] a boolean also equals the number `1` or `0`.
pub fn values_equal(a: &Value, b: &Value, equality: EnumEquality) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Bool(flag), Value::Number(n)) | (Value::Number(n), Value::Bool(flag)) => {
            equality == EnumEquality::Loose && n.as_f64() == Some(if *flag { 1.0 } else { 0.0 })
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y, equality))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| values_equal(x, y, equality)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    x.as_f64() == y.as_f64()
}

pub(crate) fn check_enum(
    cx: &Validation<'_>,
    literals: &[Value],
    node: NodeId,
    value: &Value,
    path: &InstancePath<'_>,
) -> Outcome {
    let equality = cx.config.enum_equality;
    if literals.iter().any(|literal| values_equal(value, literal, equality)) {
        return Ok(());
    }
    Err(mismatch(
        "enum",
        path,
        value,
        node,
        format!("not one of {}", Value::Array(literals.to_vec())),
    ))
}

/// `type: [...]`: one single-type view per listed type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeUnion {
    pub views: Vec<NodeId>,
    /// A listed type named nothing known, so that branch accepts anything
    pub unconstrained: bool,
}

impl TypeUnion {
    pub fn check(
        &self,
        cx: &Validation<'_>,
        node: NodeId,
        value: &Value,
        path: &InstancePath<'_>,
        depth: usize,
    ) -> Outcome {
        if self.unconstrained {
            return Ok(());
        }
        for view in &self.views {
            match cx.check(*view, value, path, depth + 1) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_mismatch() => continue,
                Err(e) => return Err(e),
            }
        }
        let listed: Vec<&str> = self
            .views
            .iter()
            .filter_map(|v| cx.graph.node(*v).fragment().get("type").and_then(Value::as_str))
            .collect();
        Err(mismatch("type", path, value, node, format!("not any of the types {:?}", listed)))
    }
}

/// Where a `$ref` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Resolved(NodeId),
    /// Kept so the failure surfaces when the reference is used
    Unresolved { pointer: String, reason: String },
}

impl RefTarget {
    pub fn check(&self, cx: &Validation<'_>, value: &Value, path: &InstancePath<'_>, depth: usize) -> Outcome {
        match self {
            Self::Resolved(target) => cx.check(*target, value, path, depth + 1),
            Self::Unresolved { pointer, reason } => Err(ValidationError::UnresolvableReference {
                pointer: pointer.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

pub(crate) fn check_any_of(
    cx: &Validation<'_>,
    branches: &[NodeId],
    node: NodeId,
    value: &Value,
    path: &InstancePath<'_>,
    depth: usize,
) -> Outcome {
    for branch in branches {
        match cx.check(*branch, value, path, depth + 1) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_mismatch() => continue,
            Err(e) => return Err(e),
        }
    }
    Err(mismatch(
        "anyOf",
        path,
        value,
        node,
        format!("matched none of {} schemas", branches.len()),
    ))
}

pub(crate) fn check_one_of(
    cx: &Validation<'_>,
    branches: &[NodeId],
    node: NodeId,
    value: &Value,
    path: &InstancePath<'_>,
    depth: usize,
) -> Outcome {
    let mut matched = 0;
    for branch in branches {
        match cx.check(*branch, value, path, depth + 1) {
            Ok(()) => matched += 1,
            Err(e) if e.is_mismatch() => {}
            Err(e) => return Err(e),
        }
    }
    if matched == 1 {
        return Ok(());
    }
    Err(mismatch(
        "oneOf",
        path,
        value,
        node,
        format!("matched {} of {} schemas, expected exactly one", matched, branches.len()),
    ))
}

pub(crate) fn check_all_of(
    cx: &Validation<'_>,
    branches: &[NodeId],
    value: &Value,
    path: &InstancePath<'_>,
    depth: usize,
) -> Outcome {
    for branch in branches {
        cx.check(*branch, value, path, depth + 1)?;
    }
    Ok(())
}

pub(crate) fn check_not(
    cx: &Validation<'_>,
    inner: NodeId,
    node: NodeId,
    value: &Value,
    path: &InstancePath<'_>,
    depth: usize,
) -> Outcome {
    match cx.check(inner, value, path, depth + 1) {
        Ok(()) => Err(mismatch("not", path, value, node, "matched a schema it must not match")),
        Err(e) if e.is_mismatch() => Ok(()),
        Err(e) => Err(e),
    }
}
