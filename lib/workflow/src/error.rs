//! Error types for the workflow crate.
//!
//! The taxonomy follows the validation policy of the editor:
//! - `ConfigError`: local validation failure, blocks a save, fully
//!   recoverable by user correction
//! - `GraphError`: structural corruption (dangling edges or references),
//!   aborts document hydration
//! - `TemplateError`: missing required settings on the persisted template
//! - `TraceError`: an execution trace that violates its own contract

use crate::node::NodeId;
use std::fmt;

/// A validation failure on a single configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The field path, e.g. `subject` or `outputs[2].path`.
    pub field: String,
    /// Human-readable message suitable for inline display.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors from structural graph operations.
///
/// These are faults in the document itself, not user-correctable form
/// input. Hydration fails fast on any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Two nodes in the document share an ID.
    DuplicateNodeId { node_id: NodeId },
    /// An edge references a node ID that is not present in the document.
    DanglingEdge { source: NodeId, target: NodeId },
    /// A node configuration references a node ID that does not exist.
    DanglingReference {
        node_id: NodeId,
        field: String,
        target: NodeId,
    },
    /// A node configuration path points back at the node itself.
    SelfReference { node_id: NodeId, field: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
            Self::DanglingEdge { source, target } => {
                write!(f, "edge references missing node: {source} -> {target}")
            }
            Self::DanglingReference {
                node_id,
                field,
                target,
            } => {
                write!(
                    f,
                    "{field} on node {node_id} references missing node {target}"
                )
            }
            Self::SelfReference { node_id, field } => {
                write!(f, "{field} on node {node_id} references the node itself")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// A blocked configuration save with per-field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The node kind whose validator rejected the save.
    pub kind: String,
    /// The individual field failures.
    pub errors: Vec<FieldError>,
}

impl ConfigError {
    #[must_use]
    pub fn new(kind: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            kind: kind.into(),
            errors,
        }
    }

    /// Returns the error for a specific field, if present.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} configuration:", self.kind)?;
        for error in &self.errors {
            write!(f, " [{error}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Missing required settings on a template about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid template settings:")?;
        for error in &self.errors {
            write!(f, " [{error}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for TemplateError {}

/// An execution trace that violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// More steps reported executed than the run contains.
    ExecutedExceedsTotal { executed: u32, total: u32 },
    /// A step completed before it started.
    StepTimingInvalid { node_id: NodeId },
    /// A stack trace was attached to a non-error step.
    UnexpectedStack { node_id: NodeId },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutedExceedsTotal { executed, total } => {
                write!(f, "{executed} steps executed but run only has {total}")
            }
            Self::StepTimingInvalid { node_id } => {
                write!(f, "step for node {node_id} completed before it started")
            }
            Self::UnexpectedStack { node_id } => {
                write!(
                    f,
                    "step for node {node_id} carries a stack trace without error status"
                )
            }
        }
    }
}

impl std::error::Error for TraceError {}

/// High-level workflow errors, unifying the lower layers.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    /// Structural graph fault.
    Graph(GraphError),
    /// Blocked configuration save.
    Config(ConfigError),
    /// Missing template settings.
    Template(TemplateError),
    /// Malformed execution trace.
    Trace(TraceError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
            Self::Template(e) => e.fmt(f),
            Self::Trace(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Template(e) => Some(e),
            Self::Trace(e) => Some(e),
        }
    }
}

impl From<GraphError> for WorkflowError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<ConfigError> for WorkflowError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TemplateError> for WorkflowError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

impl From<TraceError> for WorkflowError {
    fn from(e: TraceError) -> Self {
        Self::Trace(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let err = GraphError::DanglingEdge {
            source: NodeId::from("node-1"),
            target: NodeId::from("node-2"),
        };
        assert!(err.to_string().contains("missing node"));
        assert!(err.to_string().contains("node-1"));
    }

    #[test]
    fn config_error_field_lookup() {
        let err = ConfigError::new(
            "send-email",
            vec![
                FieldError::new("subject", "subject is required"),
                FieldError::new("to", "at least one recipient is required"),
            ],
        );
        assert!(err.field("subject").is_some());
        assert!(err.field("template").is_none());
        assert!(err.to_string().contains("send-email"));
    }

    #[test]
    fn trace_error_display() {
        let err = TraceError::ExecutedExceedsTotal {
            executed: 7,
            total: 5,
        };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn workflow_error_wraps_source() {
        use std::error::Error as _;
        let err = WorkflowError::from(GraphError::NodeNotFound {
            node_id: NodeId::from("gone"),
        });
        assert!(err.source().is_some());
    }
}
