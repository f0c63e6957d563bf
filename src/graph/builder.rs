//! Graph Building
//!
//! Interns every schema fragment reachable from the document root, resolves
//! `$ref` pointers against the root, compiles each node's validators and
//! records parent edges. Interning never recurses: new nodes go on a
//! worklist and are compiled one at a time, so a `$ref` cycle simply lands
//! on a node that is already interned.

use petgraph::graph::DiGraph;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, trace};

use super::pointer::{self, escape};
use super::{Diagnostics, EdgeKind, NodeId, SchemaGraph, SchemaNode};
use crate::checksum::Checksum;
use crate::config::SchemaGraphConfig;
use crate::error::{Result, SchemaError};
use crate::validate::dispatch::{self, KNOWN_TYPES};
use crate::validate::{
    Additional, ArrayRules, FormatRule, Items, NumericRules, ObjectRules, RefTarget, StringRules, TypeUnion,
    Validator, ValidatorKind,
};

/// Single-writer build phase of a [`SchemaGraph`]
pub struct GraphBuilder {
    document: Value,
    config: SchemaGraphConfig,
    nodes: Vec<SchemaNode>,
    index: HashMap<Checksum, NodeId>,
    edges: DiGraph<NodeId, EdgeKind>,
    ref_cache: HashMap<String, Value>,
    refs: HashMap<String, NodeId>,
    pending: VecDeque<NodeId>,
    diagnostics: Diagnostics,
}

impl GraphBuilder {
    pub fn new(document: Value, config: SchemaGraphConfig) -> Result<Self> {
        if !document.is_object() {
            return Err(SchemaError::invalid(
                "#",
                format!("schema document must be a JSON object, found {}", kind_of(&document)),
            ));
        }

        Ok(Self {
            document,
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: DiGraph::new(),
            ref_cache: HashMap::new(),
            refs: HashMap::new(),
            pending: VecDeque::new(),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Intern a fragment, returning the existing node when an equal one is
    /// already present. The new node's children are discovered later, when
    /// [`build`](Self::build) drains the worklist.
    pub fn intern(&mut self, fragment: &Value, name: Option<&str>) -> Result<NodeId> {
        let location = match name {
            Some(name) => format!("#/{}", escape(name)),
            None => "#".to_string(),
        };
        self.intern_at(fragment, name, location)
    }

    /// Number of nodes interned so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a local pointer, caching the fragment it names
    pub fn resolve_ref(&mut self, pointer: &str) -> Result<Value> {
        if let Some(fragment) = self.ref_cache.get(pointer) {
            return Ok(fragment.clone());
        }
        let fragment = pointer::resolve(&self.document, pointer)?.clone();
        self.ref_cache.insert(pointer.to_string(), fragment.clone());
        Ok(fragment)
    }

    /// Run the build phase to completion
    pub fn build(mut self) -> Result<SchemaGraph> {
        let document = self.document.clone();
        let root_name = self.config.graph.root_name.clone();

        let root = self.intern_at(&document, Some(root_name.as_str()), "#".to_string())?;
        let mut definitions = BTreeMap::new();
        definitions.insert(root_name, root);

        for tag in self.config.graph.definition_tags.clone() {
            let entries = match document.get(&tag) {
                None => continue,
                Some(Value::Object(entries)) => entries,
                Some(other) => {
                    return Err(SchemaError::invalid(
                        format!("#/{}", escape(&tag)),
                        format!("definitions container must be an object, found {}", kind_of(other)),
                    ))
                }
            };
            for (name, fragment) in entries {
                let location = format!("#/{}/{}", escape(&tag), escape(name));
                let id = self.intern_at(fragment, Some(name.as_str()), location)?;
                self.link(root, id, EdgeKind::Definition);
                definitions.insert(name.clone(), id);
            }
        }

        while let Some(id) = self.pending.pop_front() {
            self.compile(id)?;
        }

        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.edge_count(),
            definitions = definitions.len(),
            diagnostics = self.diagnostics.len(),
            "schema graph built"
        );

        Ok(SchemaGraph {
            document: self.document,
            nodes: self.nodes,
            index: self.index,
            edges: self.edges,
            root,
            definitions,
            refs: self.refs,
            diagnostics: self.diagnostics,
            config: self.config,
        })
    }

    // ========== Interning ==========

    fn intern_at(&mut self, fragment: &Value, name: Option<&str>, location: String) -> Result<NodeId> {
        if !fragment.is_object() {
            return Err(SchemaError::invalid(
                location,
                format!("expected a schema object, found {}", kind_of(fragment)),
            ));
        }

        let checksum = Checksum::canonical(fragment);
        if let Some(&id) = self.index.get(&checksum) {
            if let Some(name) = name {
                let names = &mut self.nodes[id.index()].names;
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            return Ok(id);
        }

        let id = NodeId::new(self.nodes.len());
        let graph_index = self.edges.add_node(id);
        debug_assert_eq!(graph_index, id.graph_index());

        self.nodes.push(SchemaNode {
            id,
            fragment: fragment.clone(),
            checksum: checksum.clone(),
            names: name.map(|n| vec![n.to_string()]).unwrap_or_default(),
            location,
            validators: Vec::new(),
        });
        self.index.insert(checksum, id);
        self.pending.push_back(id);
        Ok(id)
    }

    /// Intern a child fragment and record the edge from its parent
    fn child(&mut self, parent: NodeId, fragment: &Value, kind: EdgeKind, location: String) -> Result<NodeId> {
        let id = self.intern_at(fragment, None, location)?;
        self.link(parent, id, kind);
        Ok(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, kind: EdgeKind) {
        let exists = self
            .edges
            .edges_connecting(parent.graph_index(), child.graph_index())
            .any(|e| *e.weight() == kind);
        if !exists {
            self.edges.add_edge(parent.graph_index(), child.graph_index(), kind);
        }
    }

    // ========== Compilation ==========

    fn compile(&mut self, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.index()];
        let location = node.location.clone();
        let checksum = node.checksum.short().to_string();
        let Value::Object(schema) = node.fragment.clone() else {
            return Err(SchemaError::invalid(location, "expected a schema object"));
        };

        let kinds = dispatch::select(&schema);
        trace!(node = %id, checksum = %checksum, location = %location, kinds = ?kinds, "compiling node");

        let mut ignored = self.config.graph.ignored_keywords.clone();
        ignored.extend(self.config.graph.definition_tags.iter().cloned());
        let mut unused = dispatch::unused_keys(&schema, &kinds, &ignored);

        match schema.get("type") {
            Some(Value::String(name)) if !KNOWN_TYPES.contains(&name.as_str()) => {
                self.diagnostics.unknown_type(id, &location, name);
                unused.retain(|k| k != "type");
            }
            Some(Value::Array(names)) => {
                for name in names.iter().filter_map(Value::as_str) {
                    if !KNOWN_TYPES.contains(&name) {
                        self.diagnostics.unknown_type(id, &location, name);
                    }
                }
            }
            _ => {}
        }
        if !unused.is_empty() {
            self.diagnostics.unrecognized_keywords(id, &location, &unused);
        }

        let mut validators = Vec::with_capacity(kinds.len());
        for kind in kinds {
            validators.push(self.compile_kind(id, kind, &schema, &location)?);
        }
        self.nodes[id.index()].validators = validators;
        Ok(())
    }

    fn compile_kind(
        &mut self,
        id: NodeId,
        kind: ValidatorKind,
        schema: &Map<String, Value>,
        location: &str,
    ) -> Result<Validator> {
        let validator = match kind {
            ValidatorKind::Null => Validator::Null,
            ValidatorKind::Boolean => Validator::Boolean,
            ValidatorKind::Number => Validator::Number(NumericRules::compile(schema, location, false)?),
            ValidatorKind::Integer => Validator::Integer(NumericRules::compile(schema, location, true)?),
            ValidatorKind::String => {
                let rules = StringRules::compile(schema, location)?;
                match &rules.format {
                    Some(FormatRule::Known(name)) => self.diagnostics.format_not_enforced(id, location, name),
                    Some(FormatRule::Unknown(name)) => self.diagnostics.unknown_format(id, location, name),
                    None => {}
                }
                Validator::String(rules)
            }
            ValidatorKind::Array => {
                let items = match schema.get("items") {
                    None => None,
                    Some(Value::Array(positional)) => {
                        self.diagnostics.not_implemented(id, location, "tuple items");
                        Some(Items::Tuple(positional.len()))
                    }
                    Some(fragment) => Some(Items::Schema(self.child(
                        id,
                        fragment,
                        EdgeKind::Items,
                        format!("{}/items", location),
                    )?)),
                };
                Validator::Array(ArrayRules::compile(schema, location, items)?)
            }
            ValidatorKind::Object => self.compile_object(id, schema, location)?,
            ValidatorKind::Enum => match schema.get("enum") {
                Some(Value::Array(literals)) => Validator::Enum(literals.clone()),
                _ => return Err(SchemaError::invalid(location, "`enum` must be an array")),
            },
            ValidatorKind::MultiType => self.compile_type_union(id, schema, location)?,
            ValidatorKind::Ref => self.compile_ref(id, schema, location)?,
            ValidatorKind::AnyOf => Validator::AnyOf(self.branches(id, schema, "anyOf", EdgeKind::AnyOf, location)?),
            ValidatorKind::OneOf => Validator::OneOf(self.branches(id, schema, "oneOf", EdgeKind::OneOf, location)?),
            ValidatorKind::AllOf => Validator::AllOf(self.branches(id, schema, "allOf", EdgeKind::AllOf, location)?),
            ValidatorKind::Not => match schema.get("not") {
                Some(inner) => Validator::Not(self.child(id, inner, EdgeKind::Not, format!("{}/not", location))?),
                None => return Err(SchemaError::invalid(location, "`not` is missing")),
            },
        };
        Ok(validator)
    }

    fn compile_object(&mut self, id: NodeId, schema: &Map<String, Value>, location: &str) -> Result<Validator> {
        let mut properties = BTreeMap::new();
        match schema.get("properties") {
            None => {}
            Some(Value::Object(entries)) => {
                for (key, fragment) in entries {
                    let child_location = format!("{}/properties/{}", location, escape(key));
                    let child = self.child(id, fragment, EdgeKind::Property, child_location)?;
                    properties.insert(key.clone(), child);
                }
            }
            Some(other) => {
                return Err(SchemaError::invalid(
                    location,
                    format!("`properties` must be an object, found {}", kind_of(other)),
                ))
            }
        }

        let additional = match schema.get("additionalProperties") {
            None | Some(Value::Bool(true)) => Additional::Allowed,
            Some(Value::Bool(false)) => Additional::Forbidden,
            Some(fragment @ Value::Object(_)) => Additional::Schema(self.child(
                id,
                fragment,
                EdgeKind::AdditionalProperties,
                format!("{}/additionalProperties", location),
            )?),
            Some(other) => {
                return Err(SchemaError::invalid(
                    location,
                    format!("`additionalProperties` must be a boolean or a schema, found {}", kind_of(other)),
                ))
            }
        };

        let rules = ObjectRules::compile(schema, location, properties, additional)?;
        if rules.has_pattern_properties {
            self.diagnostics.not_implemented(id, location, "patternProperties");
        }
        Ok(Validator::Object(rules))
    }

    /// One single-type view per listed type: `{type: t}` plus the keys
    /// that type's kind recognizes
    fn compile_type_union(&mut self, id: NodeId, schema: &Map<String, Value>, location: &str) -> Result<Validator> {
        let Some(Value::Array(names)) = schema.get("type") else {
            return Err(SchemaError::invalid(location, "`type` must be a list here"));
        };

        let mut union = TypeUnion::default();
        for (i, name) in names.iter().enumerate() {
            let Value::String(name) = name else {
                return Err(SchemaError::invalid(
                    location,
                    format!("`type` entries must be strings, found {}", name),
                ));
            };
            let Some(kind) = ValidatorKind::for_type(name) else {
                union.unconstrained = true;
                continue;
            };

            let mut view = Map::new();
            view.insert("type".to_string(), Value::String(name.clone()));
            for key in kind.recognized_keys().iter().filter(|k| **k != "type") {
                if let Some(value) = schema.get(*key) {
                    view.insert((*key).to_string(), value.clone());
                }
            }
            let view_location = format!("{}/type/{}", location, i);
            union.views.push(self.child(id, &Value::Object(view), EdgeKind::TypeView, view_location)?);
        }

        Ok(Validator::MultiType(union))
    }

    fn compile_ref(&mut self, id: NodeId, schema: &Map<String, Value>, location: &str) -> Result<Validator> {
        let Some(Value::String(pointer)) = schema.get("$ref") else {
            return Err(SchemaError::invalid(location, "`$ref` must be a string"));
        };

        let target = match self.resolve_ref(pointer) {
            Ok(fragment) if fragment.is_object() => {
                let target = self.intern_at(&fragment, None, pointer.clone())?;
                self.link(id, target, EdgeKind::Ref);
                self.refs.insert(pointer.clone(), target);
                RefTarget::Resolved(target)
            }
            Ok(fragment) => {
                let reason = format!("target is {}, not a schema object", kind_of(&fragment));
                self.diagnostics.unresolved_ref(id, location, pointer, &reason);
                RefTarget::Unresolved {
                    pointer: pointer.clone(),
                    reason,
                }
            }
            Err(SchemaError::UnresolvableReference { pointer, reason }) => {
                debug!(node = %id, pointer = %pointer, "unresolved $ref");
                self.diagnostics.unresolved_ref(id, location, &pointer, &reason);
                RefTarget::Unresolved { pointer, reason }
            }
            Err(e) => return Err(e),
        };

        Ok(Validator::Ref(target))
    }

    fn branches(
        &mut self,
        id: NodeId,
        schema: &Map<String, Value>,
        keyword: &str,
        kind: EdgeKind,
        location: &str,
    ) -> Result<Vec<NodeId>> {
        let Some(Value::Array(fragments)) = schema.get(keyword) else {
            return Err(SchemaError::invalid(location, format!("`{}` must be an array", keyword)));
        };

        fragments
            .iter()
            .enumerate()
            .map(|(i, fragment)| self.child(id, fragment, kind, format!("{}/{}/{}", location, keyword, i)))
            .collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
