//! Schema Graph
//!
//! Content-addressed arena of schema fragments. Every distinct fragment of a
//! document (by [`Checksum`]) becomes exactly one [`SchemaNode`]; `$ref`s,
//! properties, items and combinator branches are `petgraph` edges between
//! node indices. Because a cyclic `$ref` lands on an already-interned node,
//! recursive schemas build to a finite graph.
//!
//! The graph is immutable once built and can be shared across threads for
//! validation.

pub mod analysis;
pub mod builder;
pub mod diagnostics;
pub mod pointer;

pub use analysis::Cycle;
pub use builder::GraphBuilder;
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::checksum::Checksum;
use crate::config::SchemaGraphConfig;
use crate::error::{Result, ValidationError};
use crate::validate::{InstancePath, Validation, Validator, ValidatorKind};

/// Index of a node in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    pub(crate) fn graph_index(&self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a parent node reaches a child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Named entry of a definitions container (root only)
    Definition,
    /// `$ref` target
    Ref,
    /// `properties` entry
    Property,
    /// `additionalProperties` schema
    AdditionalProperties,
    /// `items` schema
    Items,
    /// `anyOf` branch
    AnyOf,
    /// `oneOf` branch
    OneOf,
    /// `allOf` branch
    AllOf,
    /// `not` schema
    Not,
    /// Single-type view of a `type: [...]` fragment
    TypeView,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Ref => "$ref",
            Self::Property => "properties",
            Self::AdditionalProperties => "additionalProperties",
            Self::Items => "items",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::AllOf => "allOf",
            Self::Not => "not",
            Self::TypeView => "type",
        }
    }
}

/// One interned schema fragment
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) id: NodeId,
    pub(crate) fragment: Value,
    pub(crate) checksum: Checksum,
    pub(crate) names: Vec<String>,
    pub(crate) location: String,
    pub(crate) validators: Vec<Validator>,
}

impl SchemaNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The raw fragment
    pub fn fragment(&self) -> &Value {
        &self.fragment
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Definition names (or the root name) attached to this fragment
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// First name, if any
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(|s| s.as_str())
    }

    /// Pointer where the fragment was first discovered
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Kinds of the attached validators, in evaluation order
    pub fn kinds(&self) -> Vec<ValidatorKind> {
        self.validators.iter().map(Validator::kind).collect()
    }
}

/// The resolved schema graph
pub struct SchemaGraph {
    pub(crate) document: Value,
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) index: HashMap<Checksum, NodeId>,
    pub(crate) edges: DiGraph<NodeId, EdgeKind>,
    pub(crate) root: NodeId,
    pub(crate) definitions: BTreeMap<String, NodeId>,
    pub(crate) refs: HashMap<String, NodeId>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) config: SchemaGraphConfig,
}

impl SchemaGraph {
    /// Build a graph with the default configuration
    pub fn build(document: Value) -> Result<Self> {
        Self::build_with(document, &SchemaGraphConfig::default())
    }

    /// Build a graph with an explicit configuration
    pub fn build_with(document: Value, config: &SchemaGraphConfig) -> Result<Self> {
        GraphBuilder::new(document, config.clone())?.build()
    }

    /// Parse and build a graph from JSON text
    pub fn from_json_str(text: &str, config: &SchemaGraphConfig) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        Self::build_with(document, config)
    }

    /// Load and build a graph from a JSON file
    pub fn from_file(path: &Path, config: &SchemaGraphConfig) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, config)
    }

    // ========== Public API ==========

    /// Validate a value against the document root
    pub fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        self.validate_node(self.root, value)
    }

    /// Validate a value against any node of this graph
    pub fn validate_node(&self, id: NodeId, value: &Value) -> std::result::Result<(), ValidationError> {
        Validation::new(self, &self.config.validation).check(id, value, &InstancePath::Root, 0)
    }

    /// True when `validate` succeeds
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &SchemaNode {
        self.node(self.root)
    }

    /// Get a node by id.
    ///
    /// Panics if `id` did not come from this graph.
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    /// Number of interned nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Node interned for a fragment equal (canonically) to `fragment`
    pub fn lookup(&self, fragment: &Value) -> Option<NodeId> {
        self.index.get(&Checksum::canonical(fragment)).copied()
    }

    /// Root plus every named definition
    pub fn definitions(&self) -> &BTreeMap<String, NodeId> {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<NodeId> {
        self.definitions.get(name).copied()
    }

    /// The source document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Walk a local pointer against the source document
    pub fn resolve_ref(&self, pointer: &str) -> Result<&Value> {
        pointer::resolve(&self.document, pointer)
    }

    /// Node a `$ref` pointer resolved to during the build
    pub fn ref_target(&self, pointer: &str) -> Option<NodeId> {
        self.refs.get(pointer).copied()
    }

    /// Nodes that reference `id`
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        let mut parents: Vec<NodeId> = self
            .edges
            .edges_directed(id.graph_index(), Direction::Incoming)
            .filter_map(|e| self.edges.node_weight(e.source()).copied())
            .collect();
        parents.sort();
        parents.dedup();
        parents
    }

    /// Nodes referenced by `id`, with the edge kind
    pub fn children(&self, id: NodeId) -> Vec<(EdgeKind, NodeId)> {
        let mut children: Vec<(EdgeKind, NodeId)> = self
            .edges
            .edges_directed(id.graph_index(), Direction::Outgoing)
            .filter_map(|e| self.edges.node_weight(e.target()).map(|t| (*e.weight(), *t)))
            .collect();
        children.sort_by_key(|(_, t)| *t);
        children
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// Diagnostics collected while building
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Warning-severity diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.diagnostics.warnings()
    }

    pub fn config(&self) -> &SchemaGraphConfig {
        &self.config
    }

    /// Export the graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph SchemaGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#808080\"];\n");
        output.push('\n');

        let recursive: std::collections::HashSet<NodeId> = self
            .cycles()
            .into_iter()
            .flat_map(|c| c.members)
            .collect();

        for node in &self.nodes {
            let label = match node.name() {
                Some(name) => name.to_string(),
                None => {
                    let kinds: Vec<&str> = node.kinds().iter().map(|k| k.name()).collect();
                    if kinds.is_empty() {
                        "any".to_string()
                    } else {
                        kinds.join("+")
                    }
                }
            };
            let color = if node.id == self.root {
                "#4CAF50"
            } else if recursive.contains(&node.id) {
                "#FF9800"
            } else if node.name().is_some() {
                "#00BCD4"
            } else {
                "#E0E0E0"
            };
            output.push_str(&format!(
                "  n{} [label=\"{}\", fillcolor=\"{}\"];\n",
                node.id.index(),
                label.replace('"', "\\\""),
                color
            ));
        }

        output.push('\n');

        for edge in self.edges.edge_references() {
            if let (Some(source), Some(target)) = (
                self.edges.node_weight(edge.source()),
                self.edges.node_weight(edge.target()),
            ) {
                output.push_str(&format!(
                    "  n{} -> n{} [label=\"{}\"];\n",
                    source.index(),
                    target.index(),
                    edge.weight().as_str()
                ));
            }
        }

        output.push_str("}\n");
        output
    }
}

impl std::fmt::Debug for SchemaGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGraph")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.edge_count())
            .field("root", &self.root)
            .field("definitions", &self.definitions)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
