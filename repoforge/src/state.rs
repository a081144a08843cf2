//! Workflow state: the single mutable record threaded through every node.
//!
//! Exactly one node holds write access at a time - the graph engine runs
//! nodes strictly sequentially, so no locking is needed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::task::{Task, TaskOutput};

/// Run-level status of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Init,
    Analyzing,
    Generating,
    WaitingForUser,
    Error,
    Completed,
}

/// One entry of the session memory audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Node that made the decision
    pub node: String,

    /// What was decided and why
    pub summary: String,

    pub at: DateTime<Utc>,
}

/// The shared state for one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    // Identity
    pub session_id: Uuid,
    pub repo_url: String,
    pub user_request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,

    // Classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_confidence: Option<f64>,

    // Control
    pub status: WorkflowStatus,
    /// Name of the node currently (or last) holding the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_agent: Option<String>,
    /// Number of node invocations so far
    pub step_index: usize,
    /// Reviewer rejections so far; bounded by the re-planning budget
    pub replan_cycles: usize,

    // Repository context (produced by collaborators, opaque to the core)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<PathBuf>,
    pub repo_prepared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_metadata: Option<Value>,

    // Plan
    #[serde(default)]
    pub plan: Vec<Task>,
    /// Index of the task currently being driven, if any. Always indexes
    /// into `plan` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_index: Option<usize>,

    // Memory / audit
    #[serde(default)]
    pub artifacts: BTreeMap<String, TaskOutput>,
    #[serde(default)]
    pub session_memory: Vec<DecisionRecord>,

    // Review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<bool>,
}

impl WorkflowState {
    pub fn new(repo_url: impl Into<String>, user_request: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            repo_url: repo_url.into(),
            user_request: user_request.into(),
            attachment: None,
            intent: None,
            task_scope: None,
            intent_confidence: None,
            status: WorkflowStatus::Init,
            active_agent: None,
            step_index: 0,
            replan_cycles: 0,
            repo_path: None,
            repo_prepared: false,
            repo_data: None,
            repo_metadata: None,
            plan: Vec::new(),
            current_step_index: None,
            artifacts: BTreeMap::new(),
            session_memory: Vec::new(),
            approval: None,
        }
    }

    /// Append a decision record to the session memory
    pub fn record_decision(&mut self, node: impl Into<String>, summary: impl Into<String>) {
        self.session_memory.push(DecisionRecord {
            node: node.into(),
            summary: summary.into(),
            at: Utc::now(),
        });
    }

    /// Look up a fact in the repository analysis data
    pub fn repo_fact(&self, key: &str) -> Option<&Value> {
        self.repo_data.as_ref().and_then(|data| data.get(key))
    }

    /// True once a collaborator has prepared and analyzed the repository
    pub fn repo_analyzed(&self) -> bool {
        self.repo_prepared && self.repo_data.is_some()
    }
}
