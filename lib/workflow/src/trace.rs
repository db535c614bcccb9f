//! Execution trace contract.
//!
//! The test-execution engine lives outside this codebase; these types are
//! the bit-exact wire contract it produces and the read-only consumer the
//! debugging UI is built on. Field names, the step status values and the
//! ISO-8601 timestamp format must not drift.

use crate::error::TraceError;
use crate::node::NodeId;
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use trellis_core::TemplateId;

/// Payload handed to the external test-execution endpoint: either the
/// persisted template's id or the in-editor document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionRequest {
    Saved {
        #[serde(rename = "templateId")]
        template_id: TemplateId,
    },
    Inline {
        template: Template,
    },
}

/// Outcome of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// The engine's record of one executed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: String,
    pub executor_id: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub input_data: JsonValue,
    #[serde(default)]
    pub output_data: Option<JsonValue>,
    #[serde(default)]
    pub context_snapshot: JsonValue,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub config: JsonValue,
    /// Present only on error steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Run-level data inside a [`TestResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunData {
    /// Engine-owned status string; `"success"` on a clean run. Kept open
    /// because the engine may grow values this client has never seen.
    pub status: String,
    /// Total wall-clock time in milliseconds.
    pub execution_time: u64,
    pub total_steps: u32,
    pub executed_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_stack: Option<String>,
    #[serde(default)]
    pub execution_results: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_context: Option<JsonValue>,
}

/// The full response of a test execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub data: TestRunData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a run for the results header, keeping "nothing ran" distinct
/// from "everything ran successfully".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    /// The engine never reached the first step.
    NothingExecuted { total: u32 },
    /// Every step ran and the run succeeded.
    Completed { total: u32 },
    /// Execution stopped early or finished unsuccessfully.
    Partial {
        executed: u32,
        total: u32,
        failed_node_id: Option<NodeId>,
        failure_reason: Option<String>,
    },
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingExecuted { .. } => f.write_str("no steps executed"),
            Self::Completed { total } => write!(f, "all {total} steps executed"),
            Self::Partial {
                executed,
                total,
                failed_node_id,
                failure_reason,
            } => {
                write!(f, "{executed} of {total} steps executed")?;
                if let Some(node_id) = failed_node_id {
                    write!(f, "; failed at {node_id}")?;
                }
                if let Some(reason) = failure_reason {
                    write!(f, ": {reason}")?;
                }
                Ok(())
            }
        }
    }
}

impl TestResult {
    /// Checks the trace against its structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the step counts or per-step timestamps are
    /// inconsistent, or a stack trace is attached to a non-error step.
    pub fn validate(&self) -> Result<(), TraceError> {
        if self.data.executed_steps > self.data.total_steps {
            return Err(TraceError::ExecutedExceedsTotal {
                executed: self.data.executed_steps,
                total: self.data.total_steps,
            });
        }
        for step in &self.data.execution_results {
            if step.completed_at < step.started_at {
                return Err(TraceError::StepTimingInvalid {
                    node_id: step.node_id.clone(),
                });
            }
            if step.stack.is_some() && step.status != StepStatus::Error {
                return Err(TraceError::UnexpectedStack {
                    node_id: step.node_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Summarizes the run for the results header.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let executed = self.data.executed_steps;
        let total = self.data.total_steps;
        if executed == 0 && total > 0 {
            RunSummary::NothingExecuted { total }
        } else if executed >= total && self.success {
            RunSummary::Completed { total }
        } else {
            RunSummary::Partial {
                executed,
                total,
                failed_node_id: self.data.failed_node_id.clone(),
                failure_reason: self.data.failure_reason.clone(),
            }
        }
    }

    /// The failure message to surface for an unsuccessful run, falling back
    /// to a generic message when the engine supplied none.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(
            self.data
                .failure_reason
                .clone()
                .or_else(|| self.error.clone())
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| "workflow test failed".to_owned()),
        )
    }

    /// Borrowing display adapter for the results panel. Debug-detail fields
    /// are hidden unless `debug` is set; the trace itself is untouched.
    #[must_use]
    pub fn report(&self, debug: bool) -> TraceReport<'_> {
        TraceReport {
            result: self,
            debug,
        }
    }
}

/// Display-time filter over a [`TestResult`].
#[derive(Debug, Clone, Copy)]
pub struct TraceReport<'a> {
    result: &'a TestResult,
    debug: bool,
}

impl fmt::Display for TraceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.result.summary())?;
        if let Some(message) = self.result.failure_message() {
            writeln!(f, "failure: {message}")?;
        }

        for step in &self.result.data.execution_results {
            writeln!(
                f,
                "[{}] {} ({}) {}ms",
                step.status, step.node_name, step.node_id, step.duration_ms
            )?;
            for message in &step.messages {
                writeln!(f, "  message: {message}")?;
            }
            for warning in &step.warnings {
                writeln!(f, "  warning: {warning}")?;
            }
            if self.debug {
                writeln!(f, "  input: {}", step.input_data)?;
                if let Some(output) = &step.output_data {
                    writeln!(f, "  output: {output}")?;
                }
                writeln!(f, "  context: {}", step.context_snapshot)?;
                if let Some(stack) = &step.stack {
                    writeln!(f, "  stack: {stack}")?;
                }
            }
        }
        Ok(())
    }
}
