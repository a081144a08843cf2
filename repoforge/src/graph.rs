//! Workflow graph engine.
//!
//! Composes named nodes into a directed graph with conditional edges and
//! runs it to completion. Each node mutates the shared [`WorkflowState`];
//! its routing function is consulted strictly after the mutation completes.
//! Cycles are permitted - bounding them is the looping node's job, not the
//! engine's. The engine holds no state of its own across runs.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::{log_node_complete, log_node_start, RunLog};

use crate::error::ConfigError;
use crate::state::WorkflowState;

/// Routing decision returned after a node runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Hand the state to the named node
    Next(String),
    /// The node is terminal; stop the run
    End,
}

/// One node of the workflow graph
#[async_trait]
pub trait GraphNode: Send + Sync {
    fn name(&self) -> &str;

    /// Execute the node's state mutation. Collaborator calls happen here.
    async fn run(&self, state: &mut WorkflowState) -> Result<()>;

    /// Routing decision, evaluated after `run` has completed
    fn route(&self, state: &WorkflowState) -> Transition;
}

pub struct WorkflowGraph {
    nodes: HashMap<String, Arc<dyn GraphNode>>,
    entry: String,
}

impl WorkflowGraph {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            entry: entry.into(),
        }
    }

    pub fn with_node(mut self, node: Arc<dyn GraphNode>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Drive the state through the graph until a terminal node finishes.
    ///
    /// Nodes execute strictly one at a time; the only suspension points are
    /// the blocking collaborator calls a node makes before returning.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut current = self.entry.clone();
        if !self.nodes.contains_key(&current) {
            return Err(ConfigError::MissingNode { name: current }.into());
        }

        loop {
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| ConfigError::MissingNode {
                    name: current.clone(),
                })?;

            state.active_agent = Some(current.clone());
            log_node_start!(current);

            node.run(&mut state).await?;
            state.step_index += 1;

            match node.route(&state) {
                Transition::End => {
                    log_node_complete!(current);
                    RunLog::RunFinished {
                        status: format!("{:?}", state.status),
                    }
                    .emit();
                    break;
                }
                Transition::Next(next) => {
                    if !self.nodes.contains_key(&next) {
                        return Err(ConfigError::UnknownRoute {
                            node: current,
                            target: next,
                        }
                        .into());
                    }
                    log_node_complete!(current, next);
                    current = next;
                }
            }
        }

        Ok(state)
    }
}
