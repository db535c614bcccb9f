//! Node kind registry.
//!
//! Maps a semantic kind identifier to its descriptor: display name,
//! rendering type, whether a dedicated configuration editor exists, and the
//! default configuration for a freshly dropped node. Lookup is exact-match
//! on the kind string; unregistered kinds resolve to the generic
//! name/description editor.
//!
//! Adding a kind means adding one row here plus one `NodeConfig` variant —
//! dispatch everywhere else is an exhaustive `match` on the sum type.

use crate::node::{
    AiDecisionConfig, DatabaseOperationConfig, GenericConfig, NodeConfig, NodeType,
    SendEmailConfig, kind,
};

/// How the canvas renders nodes of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    Action,
    Trigger,
    Default,
    /// The kind string doubles as the rendering type.
    Specialized,
}

/// A registered node kind.
#[derive(Debug, Clone, Copy)]
pub struct NodeKindDescriptor {
    /// The semantic kind identifier (`data.id` on the wire).
    pub kind: &'static str,
    /// Human-readable name shown in the palette.
    pub display_name: &'static str,
    pub render: RenderStyle,
    /// Whether a dedicated configuration editor is registered.
    pub configurable: bool,
    default_config: fn() -> NodeConfig,
}

impl NodeKindDescriptor {
    /// Returns the rendering type for nodes of this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self.render {
            RenderStyle::Action => NodeType::Action,
            RenderStyle::Trigger => NodeType::Trigger,
            RenderStyle::Default => NodeType::Default,
            RenderStyle::Specialized => NodeType::Specialized(self.kind.to_owned()),
        }
    }

    /// Returns the default configuration for a freshly dropped node.
    #[must_use]
    pub fn default_config(&self) -> NodeConfig {
        (self.default_config)()
    }
}

static REGISTRY: &[NodeKindDescriptor] = &[
    NodeKindDescriptor {
        kind: kind::AI_DECISION,
        display_name: "AI Decision",
        render: RenderStyle::Default,
        configurable: true,
        default_config: || NodeConfig::AiDecision(AiDecisionConfig::default()),
    },
    NodeKindDescriptor {
        kind: kind::SEND_EMAIL,
        display_name: "Send Email",
        render: RenderStyle::Action,
        configurable: true,
        default_config: || NodeConfig::SendEmail(SendEmailConfig::default()),
    },
    NodeKindDescriptor {
        kind: kind::DATABASE_OPERATION,
        display_name: "Database Operation",
        render: RenderStyle::Specialized,
        configurable: true,
        default_config: || NodeConfig::DatabaseOperation(DatabaseOperationConfig::default()),
    },
];

/// Looks up a registered kind by exact identifier match.
#[must_use]
pub fn lookup(kind: &str) -> Option<&'static NodeKindDescriptor> {
    REGISTRY.iter().find(|d| d.kind == kind)
}

/// Returns true if the kind has a registered configuration editor.
#[must_use]
pub fn is_registered(kind: &str) -> bool {
    lookup(kind).is_some()
}

/// All registered kinds, in palette order.
#[must_use]
pub fn descriptors() -> &'static [NodeKindDescriptor] {
    REGISTRY
}

/// Rendering type for a kind; unregistered kinds render as `default`.
#[must_use]
pub fn node_type(kind: &str) -> NodeType {
    lookup(kind).map_or(NodeType::Default, NodeKindDescriptor::node_type)
}

/// Default configuration for a kind; unregistered kinds get the generic
/// name/description payload.
#[must_use]
pub fn default_config(kind: &str) -> NodeConfig {
    lookup(kind).map_or_else(
        || NodeConfig::Generic {
            kind: kind.to_owned(),
            config: GenericConfig::default(),
        },
        NodeKindDescriptor::default_config,
    )
}
