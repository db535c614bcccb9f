//! Persisted workflow template contract.
//!
//! A template is the JSON document exchanged with the platform's template
//! API: graph content plus the settings the save dialog collects. Tenant
//! and ownership identifiers are deliberately absent — the server derives
//! them from request context, and the client must never send one.

use crate::edge::Edge;
use crate::error::{FieldError, GraphError, TemplateError};
use crate::graph::WorkflowGraph;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use trellis_core::TemplateId;

/// The template type this client produces. Built-in templates are authored
/// server-side and never round-trip through the editor.
pub const TEMPLATE_TYPE_CUSTOM: &str = "custom";

/// Canvas pan/zoom. Carries no semantic invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Free-form organizational metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named, categorized workflow document as persisted by the template API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub template_type: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub metadata: TemplateMetadata,
    pub is_active: bool,
}

impl Template {
    /// Snapshots the current editor state into a persistable template.
    #[must_use]
    pub fn from_graph(
        name: impl Into<String>,
        category: impl Into<String>,
        graph: &WorkflowGraph,
        viewport: Viewport,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: category.into(),
            template_type: TEMPLATE_TYPE_CUSTOM.to_owned(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
            viewport,
            metadata: TemplateMetadata::default(),
            is_active: true,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds an action tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.push(tag.into());
        self
    }

    /// Checks the settings required before the save dialog may submit.
    ///
    /// # Errors
    ///
    /// Returns one field error per missing setting: name, category, and at
    /// least one action tag.
    pub fn validate_settings(&self) -> Result<(), TemplateError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "a template name is required"));
        }
        if self.category.trim().is_empty() {
            errors.push(FieldError::new("category", "a category is required"));
        }
        if self.metadata.tags.iter().all(|t| t.trim().is_empty()) {
            errors.push(FieldError::new(
                "tags",
                "at least one action tag is required",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TemplateError { errors })
        }
    }

    /// Hydrates the template into an editable graph, failing fast on
    /// structural corruption.
    ///
    /// # Errors
    ///
    /// Returns an error if the document violates referential integrity.
    pub fn hydrate(&self) -> Result<WorkflowGraph, GraphError> {
        WorkflowGraph::from_parts(self.nodes.clone(), self.edges.clone())
    }
}

impl TryFrom<Template> for WorkflowGraph {
    type Error = GraphError;

    fn try_from(template: Template) -> Result<Self, Self::Error> {
        Self::from_parts(template.nodes, template.edges)
    }
}

/// A template as returned by the persistence API, with the server-assigned
/// id attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub id: TemplateId,
    #[serde(flatten)]
    pub template: Template,
}
