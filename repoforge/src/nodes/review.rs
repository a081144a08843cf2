//! Reviewer: approves or rejects the executed plan's artifacts.
//!
//! The base policy approves unconditionally; [`ReviewPolicy`] is the hook
//! point for real review logic. Rejections route back to the planner, but
//! only within the re-planning budget - the original design left that loop
//! unbounded, so exhaustion escalates to an error status instead of cycling
//! forever.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::{log_info, log_warning, RunLog};

use crate::graph::{GraphNode, Transition};
use crate::nodes;
use crate::state::{WorkflowState, WorkflowStatus};

/// Verdict hook consulted by the reviewer node
#[async_trait]
pub trait ReviewPolicy: Send + Sync {
    async fn review(&self, state: &WorkflowState) -> Result<bool>;
}

/// Base policy: every plan is approved
pub struct ApproveAll;

#[async_trait]
impl ReviewPolicy for ApproveAll {
    async fn review(&self, _state: &WorkflowState) -> Result<bool> {
        Ok(true)
    }
}

pub struct Reviewer {
    policy: Arc<dyn ReviewPolicy>,
    max_replan_cycles: usize,
}

impl Reviewer {
    pub fn new(policy: Arc<dyn ReviewPolicy>, max_replan_cycles: usize) -> Self {
        Self {
            policy,
            max_replan_cycles,
        }
    }
}

#[async_trait]
impl GraphNode for Reviewer {
    fn name(&self) -> &str {
        nodes::REVIEWER
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let approved = self.policy.review(state).await?;
        state.approval = Some(approved);

        RunLog::ReviewOutcome {
            approved,
            replan_cycle: state.replan_cycles,
        }
        .emit();

        if approved {
            log_info!("review approved the run");
            state.record_decision(nodes::REVIEWER, "approved");
        } else {
            state.replan_cycles += 1;
            if state.replan_cycles >= self.max_replan_cycles {
                log_warning!(
                    "review rejected and the re-planning budget ({}) is exhausted",
                    self.max_replan_cycles
                );
                state.status = WorkflowStatus::Error;
                state.record_decision(
                    nodes::REVIEWER,
                    format!(
                        "rejected; re-planning budget of {} exhausted",
                        self.max_replan_cycles
                    ),
                );
            } else {
                log_warning!(
                    "review rejected the run; re-planning ({}/{})",
                    state.replan_cycles,
                    self.max_replan_cycles
                );
                state.record_decision(
                    nodes::REVIEWER,
                    format!("rejected; re-planning cycle {}", state.replan_cycles),
                );
            }
        }

        Ok(())
    }

    fn route(&self, state: &WorkflowState) -> Transition {
        if state.approval == Some(true) {
            Transition::Next(nodes::FINALIZER.to_string())
        } else if state.status == WorkflowStatus::Error {
            // Budget exhausted: stop without claiming completion
            Transition::End
        } else {
            Transition::Next(nodes::PLANNER.to_string())
        }
    }
}
