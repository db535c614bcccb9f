//! Workflow node model and per-kind configuration payloads.
//!
//! Every node carries:
//! - A document-unique string ID, assigned when the node is dropped on the
//!   canvas and preserved verbatim on load
//! - A rendering type (`action`, `trigger`, `default` or a specialized
//!   string such as `w3-database-operation`)
//! - A canvas position (cosmetic only)
//! - A kind-discriminated configuration payload
//!
//! Configuration is a closed sum type: one variant per registered kind plus
//! a generic fallback, so a node can never hold a payload its kind does not
//! define. The wire shape of `data` is `{"id": "<kind>", "config": {...}}`.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Kind identifiers for the registered node kinds.
pub mod kind {
    pub const AI_DECISION: &str = "ai-decision";
    pub const SEND_EMAIL: &str = "send-email";
    pub const DATABASE_OPERATION: &str = "w3-database-operation";
}

/// A unique identifier for a node within a document.
///
/// Unlike persisted entity IDs this is caller-visible and kind-prefixed
/// (`send-email-01j...`), so the canvas can derive a node's kind from its id
/// during drag operations. Never reused after deletion within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a fresh ID for a newly dropped node of the given kind.
    #[must_use]
    pub fn fresh(kind: &str) -> Self {
        Self(format!("{kind}-{}", Ulid::new().to_string().to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The rendering type of a node.
///
/// This discriminates how the canvas draws the node; it is independent of
/// the semantic kind held in `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Action,
    Trigger,
    Default,
    /// A specialized renderer keyed by kind, e.g. `w3-database-operation`.
    #[serde(untagged)]
    Specialized(String),
}

/// Canvas coordinates. Purely cosmetic, never validated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Tunable model parameters for an AI decision node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiParameters {
    pub max_tokens: u32,
}

impl AiParameters {
    /// Sets the token budget, clamped to the editable range.
    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.max_tokens = max_tokens.clamp(50, 2000);
    }
}

impl Default for AiParameters {
    fn default() -> Self {
        Self { max_tokens: 500 }
    }
}

/// A conditional routing entry on an AI decision node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMapping {
    /// The symbolic condition label the model output is matched against.
    pub condition: String,
    /// The node the workflow continues at when the condition matches.
    pub path: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Fallback behavior when no condition matches or the model times out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackConfig {
    pub enabled: bool,
    /// Timeout in milliseconds. Edited in seconds; see [`set_timeout_secs`].
    ///
    /// [`set_timeout_secs`]: FallbackConfig::set_timeout_secs
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<NodeId>,
}

impl FallbackConfig {
    /// Sets the timeout from the seconds-based editing control,
    /// clamped to 5..=300 seconds.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout = secs.clamp(5, 300) * 1000;
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout / 1000
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: 30_000,
            default_path: None,
        }
    }
}

/// Configuration for an `ai-decision` node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDecisionConfig {
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub parameters: AiParameters,
    #[serde(default)]
    pub outputs: Vec<OutputMapping>,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Delivery priority for outgoing email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Configuration for a `send-email` node.
///
/// Recipients and body may contain `{{variable}}` placeholders; those are
/// resolved by the execution engine, not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailConfig {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject: String,
    /// The message body template.
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub priority: EmailPriority,
    #[serde(default = "default_true")]
    pub tracking: bool,
}

impl Default for SendEmailConfig {
    fn default() -> Self {
        Self {
            to: Vec::new(),
            subject: String::new(),
            template: String::new(),
            priority: EmailPriority::Normal,
            tracking: true,
        }
    }
}

/// A single WHERE-style condition on a database operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: JsonValue,
}

/// Configuration for a `w3-database-operation` node, varying by operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum DatabaseOperationConfig {
    #[serde(rename = "SELECT", rename_all = "camelCase")]
    Select {
        #[serde(default)]
        table: String,
        /// Empty means all columns.
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        filters: Vec<FilterCondition>,
        #[serde(default = "default_select_limit")]
        limit: u32,
    },
    #[serde(rename = "INSERT", rename_all = "camelCase")]
    Insert {
        #[serde(default)]
        table: String,
        #[serde(default)]
        values: BTreeMap<String, JsonValue>,
        /// The server-assigned row id is always returned.
        #[serde(default = "default_true")]
        return_id: bool,
    },
    #[serde(rename = "UPDATE", rename_all = "camelCase")]
    Update {
        #[serde(default)]
        table: String,
        #[serde(default)]
        values: BTreeMap<String, JsonValue>,
        #[serde(default)]
        filters: Vec<FilterCondition>,
    },
    #[serde(rename = "DELETE", rename_all = "camelCase")]
    Delete {
        #[serde(default)]
        table: String,
        #[serde(default)]
        filters: Vec<FilterCondition>,
        #[serde(default = "default_true")]
        require_confirmation: bool,
    },
    #[serde(rename = "EXECUTE_QUERY", rename_all = "camelCase")]
    ExecuteQuery {
        #[serde(default)]
        query: String,
        /// Positional parameters.
        #[serde(default)]
        params: Vec<JsonValue>,
        /// When set, the execution engine rejects mutating statements.
        /// Carried here, enforced server-side.
        #[serde(default)]
        read_only: bool,
    },
}

impl DatabaseOperationConfig {
    /// Returns the target table, if the operation addresses one.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Select { table, .. }
            | Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. } => Some(table),
            Self::ExecuteQuery { .. } => None,
        }
    }

    /// Returns the filter conditions, empty for operations without any.
    #[must_use]
    pub fn filters(&self) -> &[FilterCondition] {
        match self {
            Self::Select { filters, .. }
            | Self::Update { filters, .. }
            | Self::Delete { filters, .. } => filters,
            Self::Insert { .. } | Self::ExecuteQuery { .. } => &[],
        }
    }

    /// Column names referenced by this operation (filters, value maps and
    /// explicit projections).
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        let filter_columns = self.filters().iter().map(|f| f.column.as_str());
        let value_columns = match self {
            Self::Insert { values, .. } | Self::Update { values, .. } => {
                Some(values.keys().map(String::as_str))
            }
            _ => None,
        };
        let projection = match self {
            Self::Select { columns, .. } => Some(columns.iter().map(String::as_str)),
            _ => None,
        };
        filter_columns
            .chain(value_columns.into_iter().flatten())
            .chain(projection.into_iter().flatten())
    }
}

impl Default for DatabaseOperationConfig {
    fn default() -> Self {
        Self::Select {
            table: String::new(),
            columns: Vec::new(),
            filters: Vec::new(),
            limit: default_select_limit(),
        }
    }
}

/// Fallback configuration for kinds without a registered editor:
/// a plain name/description pair, any strings accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenericConfig {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Kind-discriminated node configuration.
///
/// Serialized as `{"id": "<kind>", "config": {...}}`. Decoding an unknown
/// kind falls back to [`NodeConfig::Generic`]; decoding a known kind with a
/// malformed payload is a hard error.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    AiDecision(AiDecisionConfig),
    SendEmail(SendEmailConfig),
    DatabaseOperation(DatabaseOperationConfig),
    Generic {
        kind: String,
        config: GenericConfig,
    },
}

impl NodeConfig {
    /// Returns the semantic kind identifier of this configuration.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AiDecision(_) => kind::AI_DECISION,
            Self::SendEmail(_) => kind::SEND_EMAIL,
            Self::DatabaseOperation(_) => kind::DATABASE_OPERATION,
            Self::Generic { kind, .. } => kind,
        }
    }
}

#[derive(Serialize)]
struct RawConfigRef<'a, T: Serialize> {
    id: &'a str,
    config: &'a T,
}

#[derive(Deserialize)]
struct RawConfig {
    id: String,
    #[serde(default)]
    config: JsonValue,
}

impl Serialize for NodeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::AiDecision(config) => RawConfigRef {
                id: kind::AI_DECISION,
                config,
            }
            .serialize(serializer),
            Self::SendEmail(config) => RawConfigRef {
                id: kind::SEND_EMAIL,
                config,
            }
            .serialize(serializer),
            Self::DatabaseOperation(config) => RawConfigRef {
                id: kind::DATABASE_OPERATION,
                config,
            }
            .serialize(serializer),
            Self::Generic { kind, config } => RawConfigRef { id: kind, config }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NodeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawConfig::deserialize(deserializer)?;
        let config = if raw.config.is_null() {
            JsonValue::Object(serde_json::Map::new())
        } else {
            raw.config
        };

        match raw.id.as_str() {
            kind::AI_DECISION => serde_json::from_value(config)
                .map(Self::AiDecision)
                .map_err(D::Error::custom),
            kind::SEND_EMAIL => serde_json::from_value(config)
                .map(Self::SendEmail)
                .map_err(D::Error::custom),
            kind::DATABASE_OPERATION => serde_json::from_value(config)
                .map(Self::DatabaseOperation)
                .map_err(D::Error::custom),
            _ => serde_json::from_value(config)
                .map(|generic| Self::Generic {
                    kind: raw.id,
                    config: generic,
                })
                .map_err(D::Error::custom),
        }
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the document.
    pub id: NodeId,
    /// Rendering type.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Kind and configuration payload.
    pub data: NodeConfig,
}

impl Node {
    /// Creates a freshly dropped node of the given kind with the registry's
    /// default configuration and a new kind-prefixed id.
    #[must_use]
    pub fn new(kind: &str, position: Position) -> Self {
        Self {
            id: NodeId::fresh(kind),
            node_type: crate::registry::node_type(kind),
            position,
            data: crate::registry::default_config(kind),
        }
    }

    /// Reconstructs a node loaded from a persisted document; the id is
    /// preserved verbatim.
    #[must_use]
    pub fn with_id(id: NodeId, node_type: NodeType, position: Position, data: NodeConfig) -> Self {
        Self {
            id,
            node_type,
            position,
            data,
        }
    }

    /// Returns the semantic kind identifier of this node.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.data.kind()
    }
}

fn default_true() -> bool {
    true
}

fn default_select_limit() -> u32 {
    100
}
