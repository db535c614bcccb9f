//! Workflow template engine for the trellis platform.
//!
//! This crate provides the editor-side workflow template core, including:
//!
//! - **Graph Model**: Directed graphs using petgraph with typed nodes and edges
//! - **Node Configs**: Typed per-kind configuration with a generic fallback
//! - **Validation**: Sanitize-then-validate save gating and schema-aware warnings
//! - **Templates**: The persisted JSON contract exchanged with the template API
//! - **Traces**: The execution-trace contract produced by the test engine

pub mod catalog;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod registry;
pub mod session;
pub mod template;
pub mod trace;
pub mod validate;

pub use catalog::{ColumnInfo, SchemaCatalog, TableInfo};
pub use edge::{Edge, EdgeKind};
pub use error::{ConfigError, FieldError, GraphError, TemplateError, TraceError, WorkflowError};
pub use graph::{Connection, ConnectionOrigin, WorkflowGraph};
pub use node::{Node, NodeConfig, NodeId, NodeType, Position};
pub use registry::{NodeKindDescriptor, RenderStyle};
pub use session::{RequestGeneration, RequestToken};
pub use template::{SavedTemplate, Template, TemplateMetadata, Viewport};
pub use trace::{ExecutionRequest, RunSummary, StepResult, StepStatus, TestResult, TestRunData};
