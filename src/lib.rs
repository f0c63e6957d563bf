//! Schema Graph
//!
//! A JSON Schema (draft-04) validator built on a content-addressed graph of
//! schema fragments.
//!
//! ## Features
//!
//! - **Deduplication**: structurally equal fragments share one node, keyed by
//!   an order-independent SHA-256 checksum
//! - **Cycle-safe `$ref`**: references resolve to already-interned nodes, so
//!   recursive schemas build to a finite graph
//! - **Keyword dispatch**: each node's validators are selected once, at build
//!   time, from a closed set of kinds
//! - **Diagnostics**: unrecognized keywords and unresolved references are
//!   collected during the build instead of failing it
//!
//! ## Example
//!
//! ```
//! use schemagraph::build_graph;
//! use serde_json::json;
//!
//! let graph = build_graph(json!({
//!     "type": "object",
//!     "properties": {"a": {"type": "integer"}},
//!     "required": ["a"]
//! }))
//! .unwrap();
//!
//! assert!(graph.validate(&json!({"a": 1})).is_ok());
//! assert!(graph.validate(&json!({})).is_err());
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod graph;
pub mod validate;

pub use checksum::Checksum;
pub use config::{EnumEquality, GraphConfig, SchemaGraphConfig, ValidationConfig};
pub use error::{Result, SchemaError, ValidationError};
pub use graph::{
    Cycle, DiagnosticCode, DiagnosticItem, Diagnostics, EdgeKind, GraphBuilder, NodeId, SchemaGraph, SchemaNode,
    Severity,
};
pub use validate::{Validator, ValidatorKind};

/// Build a schema graph with the default configuration
pub fn build_graph(document: serde_json::Value) -> Result<SchemaGraph> {
    SchemaGraph::build(document)
}
