//! Finalizer: the terminal node of the graph.

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::log_info;

use crate::graph::{GraphNode, Transition};
use crate::nodes;
use crate::state::{WorkflowState, WorkflowStatus};

pub struct Finalizer;

#[async_trait]
impl GraphNode for Finalizer {
    fn name(&self) -> &str {
        nodes::FINALIZER
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        state.status = WorkflowStatus::Completed;
        state.record_decision(nodes::FINALIZER, "run completed");
        log_info!("run {} completed", state.session_id);
        Ok(())
    }

    fn route(&self, _state: &WorkflowState) -> Transition {
        Transition::End
    }
}
