//! Per-kind configuration validation.
//!
//! Saving a node's configuration runs two passes:
//!
//! 1. **Sanitize** — lossy, silent normalization (drop malformed AI-decision
//!    outputs, trim recipients, clamp the token budget). Idempotent: running
//!    it twice yields the same payload.
//! 2. **Validate** — blocking checks that surface inline field errors and
//!    abort the save.
//!
//! Semantic checks against real database schema are advisory only: the
//! server is the authority, so unknown tables or columns produce warnings,
//! never errors.

use crate::catalog::SchemaCatalog;
use crate::error::{ConfigError, FieldError};
use crate::node::{DatabaseOperationConfig, NodeConfig, NodeId};
use std::collections::HashSet;

/// Document-wide context a validator needs: which node is being edited and
/// which node ids currently exist.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    node_id: &'a NodeId,
    known: HashSet<&'a NodeId>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(node_id: &'a NodeId, known: impl IntoIterator<Item = &'a NodeId>) -> Self {
        Self {
            node_id,
            known: known.into_iter().collect(),
        }
    }

    /// Returns true if the id refers to a node present in the document.
    #[must_use]
    pub fn resolves(&self, id: &NodeId) -> bool {
        self.known.contains(id)
    }

    /// Returns true if the id is the node currently being edited.
    #[must_use]
    pub fn is_self(&self, id: &NodeId) -> bool {
        self.node_id == id
    }
}

impl NodeConfig {
    /// Silent normalization applied before validation.
    pub fn sanitize(&mut self) {
        match self {
            Self::AiDecision(config) => {
                config
                    .outputs
                    .retain(|o| !o.condition.trim().is_empty() && !o.path.as_str().trim().is_empty());
                let tokens = config.parameters.max_tokens;
                config.parameters.set_max_tokens(tokens);
            }
            Self::SendEmail(config) => {
                config.to = config
                    .to
                    .iter()
                    .map(|r| r.trim().to_owned())
                    .filter(|r| !r.is_empty())
                    .collect();
            }
            Self::DatabaseOperation(_) | Self::Generic { .. } => {}
        }
    }

    /// Blocking save-time checks. An `Err` carries one entry per offending
    /// field for inline display; the configuration must not be applied.
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        match self {
            Self::AiDecision(config) => {
                if config.outputs.is_empty() {
                    errors.push(FieldError::new(
                        "outputs",
                        "at least one output mapping with a destination is required",
                    ));
                }
                for (i, output) in config.outputs.iter().enumerate() {
                    check_path_reference(
                        &mut errors,
                        ctx,
                        &output.path,
                        &format!("outputs[{i}].path"),
                    );
                }
                if let Some(path) = &config.fallback.default_path {
                    check_path_reference(&mut errors, ctx, path, "fallback.defaultPath");
                }
                if config.fallback.enabled && !(5_000..=300_000).contains(&config.fallback.timeout)
                {
                    errors.push(FieldError::new(
                        "fallback.timeout",
                        "timeout must be between 5 and 300 seconds",
                    ));
                }
            }
            Self::SendEmail(config) => {
                if config.to.iter().all(|r| r.trim().is_empty()) {
                    errors.push(FieldError::new("to", "at least one recipient is required"));
                }
                if config.subject.trim().is_empty() {
                    errors.push(FieldError::new("subject", "subject is required"));
                }
                if config.template.trim().is_empty() {
                    errors.push(FieldError::new("template", "body is required"));
                }
            }
            Self::DatabaseOperation(config) => validate_database_operation(config, &mut errors),
            Self::Generic { .. } => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(self.kind(), errors))
        }
    }

    /// Advisory schema checks against introspected metadata. Mismatches are
    /// warnings only; the server rejects them authoritatively.
    #[must_use]
    pub fn advisory_warnings(&self, catalog: &SchemaCatalog) -> Vec<String> {
        let Self::DatabaseOperation(config) = self else {
            return Vec::new();
        };
        let Some(table_name) = config.table() else {
            return Vec::new();
        };
        if table_name.is_empty() {
            return Vec::new();
        }

        let mut warnings = Vec::new();
        match catalog.table(table_name) {
            None => warnings.push(format!(
                "table '{table_name}' is not present in schema '{}'",
                catalog.schema
            )),
            Some(table) => {
                for column in config.referenced_columns() {
                    if !table.has_column(column) {
                        warnings.push(format!(
                            "column '{column}' is not present on table '{table_name}'"
                        ));
                    }
                }
            }
        }
        warnings
    }
}

fn check_path_reference(
    errors: &mut Vec<FieldError>,
    ctx: &ValidationContext<'_>,
    path: &NodeId,
    field: &str,
) {
    if ctx.is_self(path) {
        errors.push(FieldError::new(field, "must not reference the node itself"));
    } else if !ctx.resolves(path) {
        errors.push(FieldError::new(
            field,
            format!("references unknown node {path}"),
        ));
    }
}

fn validate_database_operation(config: &DatabaseOperationConfig, errors: &mut Vec<FieldError>) {
    if let Some(table) = config.table()
        && table.trim().is_empty()
    {
        errors.push(FieldError::new("table", "a table is required"));
    }

    match config {
        DatabaseOperationConfig::Select { limit, .. } => {
            if !(1..=1000).contains(limit) {
                errors.push(FieldError::new("limit", "limit must be between 1 and 1000"));
            }
        }
        DatabaseOperationConfig::Insert { values, .. } => {
            if values.is_empty() {
                errors.push(FieldError::new(
                    "values",
                    "at least one column value is required",
                ));
            }
        }
        DatabaseOperationConfig::Update {
            values, filters, ..
        } => {
            if values.is_empty() {
                errors.push(FieldError::new(
                    "values",
                    "at least one column value is required",
                ));
            }
            if filters.is_empty() {
                errors.push(FieldError::new(
                    "filters",
                    "UPDATE requires at least one filter condition",
                ));
            }
        }
        DatabaseOperationConfig::Delete { filters, .. } => {
            if filters.is_empty() {
                errors.push(FieldError::new(
                    "filters",
                    "DELETE requires at least one filter condition",
                ));
            }
        }
        DatabaseOperationConfig::ExecuteQuery { query, .. } => {
            if query.trim().is_empty() {
                errors.push(FieldError::new("query", "a query is required"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnInfo, SchemaCatalog, TableInfo};
    use crate::node::{
        AiDecisionConfig, FallbackConfig, FilterCondition, OutputMapping, SendEmailConfig,
    };
    use std::collections::BTreeMap;

    fn ctx_with<'a>(node_id: &'a NodeId, known: &'a [NodeId]) -> ValidationContext<'a> {
        ValidationContext::new(node_id, known.iter())
    }

    #[test]
    fn send_email_empty_config_reports_all_three_fields() {
        let config = NodeConfig::SendEmail(SendEmailConfig {
            to: vec![],
            subject: String::new(),
            template: String::new(),
            ..SendEmailConfig::default()
        });
        let node_id = NodeId::from("send-email-1");
        let known = [node_id.clone()];
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();

        assert_eq!(err.errors.len(), 3);
        assert!(err.field("to").is_some());
        assert!(err.field("subject").is_some());
        assert!(err.field("template").is_some());
    }

    #[test]
    fn send_email_valid_config_passes_with_defaults_intact() {
        let config = NodeConfig::SendEmail(SendEmailConfig {
            to: vec!["a@b.com".into()],
            subject: "S".into(),
            template: "T".into(),
            ..SendEmailConfig::default()
        });
        let node_id = NodeId::from("send-email-1");
        let known = [node_id.clone()];
        assert!(config.validate(&ctx_with(&node_id, &known)).is_ok());

        let value = serde_json::to_value(&config).expect("serialize");
        assert_eq!(value["config"]["to"], serde_json::json!(["a@b.com"]));
        assert_eq!(value["config"]["priority"], "normal");
        assert_eq!(value["config"]["tracking"], true);
    }

    #[test]
    fn send_email_sanitize_drops_blank_recipients() {
        let mut config = NodeConfig::SendEmail(SendEmailConfig {
            to: vec!["  ".into(), "a@b.com ".into(), String::new()],
            ..SendEmailConfig::default()
        });
        config.sanitize();
        match config {
            NodeConfig::SendEmail(inner) => assert_eq!(inner.to, vec!["a@b.com"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ai_decision_outputs_filter_keeps_only_complete_entries() {
        let mut config = NodeConfig::AiDecision(AiDecisionConfig {
            outputs: vec![
                OutputMapping {
                    condition: "approve".into(),
                    path: NodeId::from("node2"),
                    label: None,
                },
                OutputMapping {
                    condition: String::new(),
                    path: NodeId::from("node3"),
                    label: None,
                },
                OutputMapping {
                    condition: "reject".into(),
                    path: NodeId::from(""),
                    label: None,
                },
            ],
            ..AiDecisionConfig::default()
        });
        config.sanitize();
        match &config {
            NodeConfig::AiDecision(inner) => {
                assert_eq!(inner.outputs.len(), 1);
                assert_eq!(inner.outputs[0].condition, "approve");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut config = NodeConfig::AiDecision(AiDecisionConfig {
            parameters: crate::node::AiParameters { max_tokens: 9999 },
            outputs: vec![
                OutputMapping {
                    condition: "approve".into(),
                    path: NodeId::from("node2"),
                    label: None,
                },
                OutputMapping {
                    condition: String::new(),
                    path: NodeId::from("node3"),
                    label: None,
                },
            ],
            ..AiDecisionConfig::default()
        });
        config.sanitize();
        let once = config.clone();
        config.sanitize();
        assert_eq!(config, once);
    }

    #[test]
    fn ai_decision_self_reference_rejected() {
        let node_id = NodeId::from("ai-decision-1");
        let config = NodeConfig::AiDecision(AiDecisionConfig {
            outputs: vec![OutputMapping {
                condition: "approve".into(),
                path: NodeId::from("node2"),
                label: None,
            }],
            fallback: FallbackConfig {
                enabled: true,
                timeout: 30_000,
                default_path: Some(node_id.clone()),
            },
            ..AiDecisionConfig::default()
        });
        let known = [node_id.clone(), NodeId::from("node2")];
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
        let field = err.field("fallback.defaultPath").expect("field error");
        assert!(field.message.contains("itself"));
    }

    #[test]
    fn ai_decision_unknown_path_rejected() {
        let node_id = NodeId::from("ai-decision-1");
        let config = NodeConfig::AiDecision(AiDecisionConfig {
            outputs: vec![OutputMapping {
                condition: "approve".into(),
                path: NodeId::from("missing"),
                label: None,
            }],
            ..AiDecisionConfig::default()
        });
        let known = [node_id.clone()];
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
        assert!(err.field("outputs[0].path").is_some());
    }

    #[test]
    fn ai_decision_empty_outputs_after_filter_blocks_save() {
        let node_id = NodeId::from("ai-decision-1");
        let mut config = NodeConfig::AiDecision(AiDecisionConfig {
            outputs: vec![OutputMapping {
                condition: String::new(),
                path: NodeId::from("node2"),
                label: None,
            }],
            ..AiDecisionConfig::default()
        });
        config.sanitize();
        let known = [node_id.clone(), NodeId::from("node2")];
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
        assert!(err.field("outputs").is_some());
    }

    #[test]
    fn ai_decision_timeout_bounds_enforced_when_enabled() {
        let node_id = NodeId::from("ai-decision-1");
        let known = [node_id.clone(), NodeId::from("node2")];
        let mut base = AiDecisionConfig {
            outputs: vec![OutputMapping {
                condition: "approve".into(),
                path: NodeId::from("node2"),
                label: None,
            }],
            fallback: FallbackConfig {
                enabled: true,
                timeout: 1_000,
                default_path: None,
            },
            ..AiDecisionConfig::default()
        };
        let err = NodeConfig::AiDecision(base.clone())
            .validate(&ctx_with(&node_id, &known))
            .unwrap_err();
        assert!(err.field("fallback.timeout").is_some());

        // Same timeout is fine while the fallback is disabled.
        base.fallback.enabled = false;
        assert!(
            NodeConfig::AiDecision(base)
                .validate(&ctx_with(&node_id, &known))
                .is_ok()
        );
    }

    #[test]
    fn select_limit_out_of_range_rejected() {
        let node_id = NodeId::from("w3-database-operation-1");
        let known = [node_id.clone()];
        for limit in [0, 5000] {
            let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Select {
                table: "employees".into(),
                columns: vec![],
                filters: vec![],
                limit,
            });
            let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
            assert!(err.field("limit").is_some(), "limit {limit} accepted");
        }

        for limit in [1, 100, 1000] {
            let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Select {
                table: "employees".into(),
                columns: vec![],
                filters: vec![],
                limit,
            });
            assert!(config.validate(&ctx_with(&node_id, &known)).is_ok());
        }
    }

    #[test]
    fn update_requires_filters_and_values() {
        let node_id = NodeId::from("w3-database-operation-1");
        let known = [node_id.clone()];
        let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Update {
            table: "employees".into(),
            values: BTreeMap::new(),
            filters: vec![],
        });
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
        assert!(err.field("values").is_some());
        assert!(err.field("filters").is_some());
    }

    #[test]
    fn delete_requires_filters() {
        let node_id = NodeId::from("w3-database-operation-1");
        let known = [node_id.clone()];
        let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Delete {
            table: "employees".into(),
            filters: vec![],
            require_confirmation: true,
        });
        let err = config.validate(&ctx_with(&node_id, &known)).unwrap_err();
        assert!(err.field("filters").is_some());
    }

    #[test]
    fn execute_query_skips_table_requirement() {
        let node_id = NodeId::from("w3-database-operation-1");
        let known = [node_id.clone()];
        let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::ExecuteQuery {
            query: "SELECT count(*) FROM employees".into(),
            params: vec![],
            read_only: true,
        });
        assert!(config.validate(&ctx_with(&node_id, &known)).is_ok());

        let empty = NodeConfig::DatabaseOperation(DatabaseOperationConfig::ExecuteQuery {
            query: "  ".into(),
            params: vec![],
            read_only: true,
        });
        let err = empty.validate(&ctx_with(&node_id, &known)).unwrap_err();
        assert!(err.field("query").is_some());
    }

    fn hr_catalog() -> SchemaCatalog {
        SchemaCatalog {
            schema: "hr".into(),
            tables: vec![TableInfo {
                table: "employees".into(),
                table_type: "BASE TABLE".into(),
                columns: vec![
                    ColumnInfo {
                        name: "id".into(),
                        data_type: "integer".into(),
                        nullable: false,
                        default: None,
                    },
                    ColumnInfo {
                        name: "email".into(),
                        data_type: "text".into(),
                        nullable: true,
                        default: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn schema_mismatches_warn_but_do_not_block() {
        let node_id = NodeId::from("w3-database-operation-1");
        let known = [node_id.clone()];
        let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Select {
            table: "employees".into(),
            columns: vec!["salary".into()],
            filters: vec![FilterCondition {
                column: "email".into(),
                operator: "=".into(),
                value: serde_json::json!("a@b.com"),
            }],
            limit: 100,
        });

        assert!(config.validate(&ctx_with(&node_id, &known)).is_ok());
        let warnings = config.advisory_warnings(&hr_catalog());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("salary"));
    }

    #[test]
    fn unknown_table_warns() {
        let config = NodeConfig::DatabaseOperation(DatabaseOperationConfig::Delete {
            table: "payroll".into(),
            filters: vec![FilterCondition {
                column: "id".into(),
                operator: "=".into(),
                value: serde_json::json!(1),
            }],
            require_confirmation: true,
        });
        let warnings = config.advisory_warnings(&hr_catalog());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("payroll"));
    }

    #[test]
    fn generic_config_always_valid() {
        let node_id = NodeId::from("approval-gate-1");
        let known = [node_id.clone()];
        let config = NodeConfig::Generic {
            kind: "approval-gate".into(),
            config: crate::node::GenericConfig {
                label: String::new(),
                description: String::new(),
            },
        };
        assert!(config.validate(&ctx_with(&node_id, &known)).is_ok());
    }
}
