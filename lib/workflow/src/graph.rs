//! In-memory workflow graph built on petgraph.
//!
//! The graph is the editing surface behind the canvas: nodes and drawn
//! edges live in a `DiGraph`, with a `NodeId -> NodeIndex` side map for
//! O(1) lookup by document id.
//!
//! Conditional branches held in AI-decision configuration are *not*
//! mirrored into the edge set; `connections()` exposes drawn edges and
//! config-held references through one view so referential integrity is
//! checked in exactly one place.
//!
//! Hydration fails fast: a dangling edge or configuration reference in a
//! persisted document is structural corruption, not a recoverable warning.

use crate::catalog::SchemaCatalog;
use crate::edge::{Edge, EdgeKind};
use crate::error::{GraphError, WorkflowError};
use crate::node::{Node, NodeConfig, NodeId, Position};
use crate::validate::ValidationContext;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Where a logical connection is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOrigin {
    /// A user-drawn edge in the edge set.
    Drawn,
    /// An AI-decision output mapping.
    OutputPath,
    /// An AI-decision fallback path.
    FallbackPath,
}

impl ConnectionOrigin {
    fn field(self) -> &'static str {
        match self {
            Self::Drawn => "edge",
            Self::OutputPath => "outputs.path",
            Self::FallbackPath => "fallback.defaultPath",
        }
    }
}

/// A logical connection between two nodes, regardless of where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub condition: Option<String>,
    pub origin: ConnectionOrigin,
}

/// A workflow graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    graph: DiGraph<Node, Edge>,
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from document parts, enforcing referential integrity.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id, an edge endpoint does not
    /// resolve, or a configuration path reference is dangling or
    /// self-referencing.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            let (Some(&source_index), Some(&target_index)) = (
                graph.node_index_map.get(&edge.source),
                graph.node_index_map.get(&edge.target),
            ) else {
                return Err(GraphError::DanglingEdge {
                    source: edge.source,
                    target: edge.target,
                });
            };
            graph.graph.add_edge(source_index, target_index, edge);
        }
        graph.validate()?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "hydrated workflow graph"
        );
        Ok(graph)
    }

    /// Adds an existing node (e.g. one loaded from a document).
    ///
    /// # Errors
    ///
    /// Returns an error if a node with the same id is already present.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.node_index_map.contains_key(&node.id) {
            return Err(GraphError::DuplicateNodeId { node_id: node.id });
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.node_index_map.insert(id.clone(), index);
        Ok(id)
    }

    /// Drops a fresh node of the given kind onto the canvas.
    ///
    /// The node gets the registry's default configuration and a new
    /// kind-prefixed id, regenerated in the unlikely event of a collision.
    pub fn insert(&mut self, kind: &str, position: Position) -> NodeId {
        let mut node = Node::new(kind, position);
        while self.node_index_map.contains_key(&node.id) {
            node.id = NodeId::fresh(kind);
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.node_index_map.insert(id.clone(), index);
        id
    }

    /// Removes a node, cascading to everything that referenced it: incident
    /// edges are deleted, AI-decision outputs targeting it are dropped, and
    /// a matching fallback path is cleared.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let index = self.node_index_map.remove(node_id)?;
        let removed = self.graph.remove_node(index)?;
        // remove_node swap-relocates the last node index.
        self.rebuild_index_map();

        for node in self.graph.node_weights_mut() {
            if let NodeConfig::AiDecision(config) = &mut node.data {
                let before = config.outputs.len();
                config.outputs.retain(|o| o.path != *node_id);
                if config.outputs.len() != before {
                    warn!(
                        node = %node.id,
                        removed = %node_id,
                        "dropped output mappings referencing removed node"
                    );
                }
                if config.fallback.default_path.as_ref() == Some(node_id) {
                    config.fallback.default_path = None;
                    warn!(
                        node = %node.id,
                        removed = %node_id,
                        "cleared fallback path referencing removed node"
                    );
                }
            }
        }
        Some(removed)
    }

    /// Draws an edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is missing, or if a conditional
    /// edge would point a node at itself.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        let &source_index = self
            .node_index_map
            .get(source)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: source.clone(),
            })?;
        let &target_index = self
            .node_index_map
            .get(target)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: target.clone(),
            })?;

        if source == target && matches!(kind, EdgeKind::Conditional { .. }) {
            return Err(GraphError::SelfReference {
                node_id: source.clone(),
                field: "condition".to_owned(),
            });
        }

        self.graph.add_edge(
            source_index,
            target_index,
            Edge {
                source: source.clone(),
                target: target.clone(),
                label: None,
                kind,
            },
        );
        Ok(())
    }

    /// Returns a reference to a node by its document id.
    #[must_use]
    pub fn get_node(&self, node_id: &NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns a mutable reference to a node by its document id.
    ///
    /// The id itself must not be changed through this reference; use
    /// [`apply_config`] for configuration edits so validation runs.
    ///
    /// [`apply_config`]: WorkflowGraph::apply_config
    pub fn get_node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight_mut(*index)
    }

    /// Moves a node on the canvas. Positions are cosmetic; no validation.
    pub fn set_position(&mut self, node_id: &NodeId, position: Position) {
        if let Some(&index) = self.node_index_map.get(node_id)
            && let Some(node) = self.graph.node_weight_mut(index)
        {
            node.position = position;
        }
    }

    /// Saves a node's configuration: sanitize, validate against the current
    /// document, then replace wholesale (never a partial merge).
    ///
    /// Returns advisory schema warnings when a catalog is supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or validation blocks the
    /// save; the node's existing configuration is left untouched.
    pub fn apply_config(
        &mut self,
        node_id: &NodeId,
        mut config: NodeConfig,
        catalog: Option<&SchemaCatalog>,
    ) -> Result<Vec<String>, WorkflowError> {
        let &index = self
            .node_index_map
            .get(node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;

        config.sanitize();
        let ctx = ValidationContext::new(node_id, self.node_index_map.keys());
        config.validate(&ctx)?;

        let warnings = catalog
            .map(|c| config.advisory_warnings(c))
            .unwrap_or_default();

        if let Some(node) = self.graph.node_weight_mut(index) {
            debug!(node = %node.id, kind = config.kind(), "applied node configuration");
            node.data = config;
        }
        Ok(warnings)
    }

    /// Returns all nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns all drawn edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All logical connections: drawn edges plus config-held conditional
    /// references.
    #[must_use]
    pub fn connections(&self) -> Vec<Connection> {
        let mut connections = Vec::new();

        for edge in self.graph.edge_weights() {
            connections.push(Connection {
                source: edge.source.clone(),
                target: edge.target.clone(),
                condition: edge.kind.condition().map(str::to_owned),
                origin: ConnectionOrigin::Drawn,
            });
        }

        for node in self.nodes() {
            if let NodeConfig::AiDecision(config) = &node.data {
                for output in &config.outputs {
                    connections.push(Connection {
                        source: node.id.clone(),
                        target: output.path.clone(),
                        condition: Some(output.condition.clone()),
                        origin: ConnectionOrigin::OutputPath,
                    });
                }
                if let Some(path) = &config.fallback.default_path {
                    connections.push(Connection {
                        source: node.id.clone(),
                        target: path.clone(),
                        condition: None,
                        origin: ConnectionOrigin::FallbackPath,
                    });
                }
            }
        }

        connections
    }

    /// Checks referential integrity across every logical connection.
    ///
    /// # Errors
    ///
    /// Returns the first dangling or self-referencing connection found.
    pub fn validate(&self) -> Result<(), GraphError> {
        for connection in self.connections() {
            match connection.origin {
                ConnectionOrigin::Drawn => {
                    if !self.node_index_map.contains_key(&connection.target)
                        || !self.node_index_map.contains_key(&connection.source)
                    {
                        return Err(GraphError::DanglingEdge {
                            source: connection.source,
                            target: connection.target,
                        });
                    }
                }
                ConnectionOrigin::OutputPath | ConnectionOrigin::FallbackPath => {
                    if connection.source == connection.target {
                        return Err(GraphError::SelfReference {
                            node_id: connection.source,
                            field: connection.origin.field().to_owned(),
                        });
                    }
                    if !self.node_index_map.contains_key(&connection.target) {
                        return Err(GraphError::DanglingReference {
                            node_id: connection.source,
                            field: connection.origin.field().to_owned(),
                            target: connection.target,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn rebuild_index_map(&mut self) {
        self.node_index_map.clear();
        for index in self.graph.node_indices() {
            if let Some(node) = self.graph.node_weight(index) {
                self.node_index_map.insert(node.id.clone(), index);
            }
        }
    }
}

impl Serialize for WorkflowGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let nodes: Vec<&Node> = self.graph.node_weights().collect();
        let edges: Vec<&Edge> = self.graph.edge_weights().collect();
        let mut state = serializer.serialize_struct("WorkflowGraph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for WorkflowGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Parts {
            #[serde(default)]
            nodes: Vec<Node>,
            #[serde(default)]
            edges: Vec<Edge>,
        }

        let parts = Parts::deserialize(deserializer)?;
        Self::from_parts(parts.nodes, parts.edges).map_err(serde::de::Error::custom)
    }
}
