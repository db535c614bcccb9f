//! Edge types for workflow documents.
//!
//! Branching exists in two places in the editor: edges the user draws on
//! the canvas, and conditional paths held inside AI-decision configuration.
//! Both are represented here by a single edge shape tagged with a `kind`
//! discriminant, so integrity checking never has to special-case the two.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// How a connection routes control flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EdgeKind {
    /// Unconditional hand-off from source to target.
    #[default]
    Direct,
    /// Taken only when the symbolic condition label matches at runtime.
    Conditional { condition: String },
}

impl EdgeKind {
    /// Returns the condition label for conditional edges.
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        match self {
            Self::Direct => None,
            Self::Conditional { condition } => Some(condition),
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Display label, no runtime meaning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

impl Edge {
    /// Creates an unconditional edge.
    #[must_use]
    pub fn direct(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            label: None,
            kind: EdgeKind::Direct,
        }
    }

    /// Creates a conditional edge with the given condition label.
    #[must_use]
    pub fn conditional(source: NodeId, target: NodeId, condition: impl Into<String>) -> Self {
        Self {
            source,
            target,
            label: None,
            kind: EdgeKind::Conditional {
                condition: condition.into(),
            },
        }
    }

    /// Attaches a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_edge_has_no_condition() {
        let edge = Edge::direct(NodeId::from("a"), NodeId::from("b"));
        assert!(edge.kind.condition().is_none());
    }

    #[test]
    fn conditional_edge_carries_label() {
        let edge = Edge::conditional(NodeId::from("a"), NodeId::from("b"), "approve")
            .with_label("Approved");
        assert_eq!(edge.kind.condition(), Some("approve"));
        assert_eq!(edge.label.as_deref(), Some("Approved"));
    }

    #[test]
    fn edge_wire_shape_flattens_kind() {
        let edge = Edge::conditional(NodeId::from("a"), NodeId::from("b"), "reject");
        let value = serde_json::to_value(&edge).expect("serialize");
        assert_eq!(value["source"], "a");
        assert_eq!(value["target"], "b");
        assert_eq!(value["kind"], "conditional");
        assert_eq!(value["condition"], "reject");

        let direct = serde_json::to_value(Edge::direct(NodeId::from("a"), NodeId::from("b")))
            .expect("serialize");
        assert_eq!(direct["kind"], "direct");
        assert!(direct.get("condition").is_none());
    }

    #[test]
    fn edge_serde_roundtrip() {
        let edge = Edge::conditional(NodeId::from("x"), NodeId::from("y"), "escalate");
        let json = serde_json::to_string(&edge).expect("serialize");
        let parsed: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge, parsed);
    }
}
