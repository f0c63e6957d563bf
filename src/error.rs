//! Error types for graph construction and validation

use serde_json::Value;
use std::io;
use thiserror::Error;

use crate::graph::NodeId;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while loading a schema document or building its graph
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema at {location}: {reason}")]
    InvalidSchema { location: String, reason: String },

    #[error("Unresolvable reference '{pointer}': {reason}")]
    UnresolvableReference { pointer: String, reason: String },

    #[error("Invalid pattern '{pattern}' at {location}: {source}")]
    InvalidPattern {
        pattern: String,
        location: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn invalid(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// First failure reported by [`SchemaGraph::validate`](crate::SchemaGraph::validate)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The value does not conform to the schema
    #[error("{value} at '{instance_path}' failed `{keyword}` (schema node {node}): {message}")]
    Mismatch {
        keyword: &'static str,
        instance_path: String,
        /// Compact JSON of the rejected value, cut off after a few dozen bytes
        value: String,
        node: NodeId,
        message: String,
    },

    /// A `$ref` in the schema could not be followed
    #[error("Unresolvable reference '{pointer}': {reason}")]
    UnresolvableReference { pointer: String, reason: String },

    /// The schema uses a construct this engine does not support
    #[error("{construct} is not implemented (schema node {node})")]
    NotImplemented { construct: &'static str, node: NodeId },

    /// Validation recursed deeper than the configured limit
    #[error("Validation depth limit {limit} exceeded at '{instance_path}'")]
    DepthExceeded { limit: usize, instance_path: String },
}

impl ValidationError {
    /// True for an ordinary value mismatch, false for schema or engine failures.
    ///
    /// Combinators only absorb mismatches.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// Keyword that rejected the value, if this is a mismatch
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::Mismatch { keyword, .. } => Some(keyword),
            _ => None,
        }
    }
}

const PREVIEW_LIMIT: usize = 80;

/// Collects serializer output and refuses to grow past `limit` bytes
struct BoundedBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl io::Write for BoundedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.bytes.len();
        if data.len() > room {
            self.bytes.extend_from_slice(&data[..room]);
            return Err(io::Error::new(io::ErrorKind::WriteZero, "preview limit reached"));
        }
        self.bytes.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compact JSON for `value`, serializing no more than the preview limit
pub(crate) fn preview(value: &Value) -> String {
    let mut buffer = BoundedBuffer {
        bytes: Vec::with_capacity(PREVIEW_LIMIT + 1),
        limit: PREVIEW_LIMIT + 1,
    };
    let truncated = serde_json::to_writer(&mut buffer, value).is_err();
    let mut bytes = buffer.bytes;
    if truncated {
        bytes.truncate(PREVIEW_LIMIT);
    }

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        // cut inside a multi-byte character
        Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    if truncated {
        format!("{}...", text)
    } else {
        text.to_string()
    }
}
