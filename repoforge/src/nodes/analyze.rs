//! Repo-analysis node: prepares the working tree and gathers repository
//! facts before planning.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use repoforge_sdk::log_info;
use serde_json::json;

use crate::collaborators::RepoCollaborator;
use crate::graph::{GraphNode, Transition};
use crate::nodes;
use crate::state::WorkflowState;

pub struct RepoAnalysis {
    repo: Arc<dyn RepoCollaborator>,
}

impl RepoAnalysis {
    pub fn new(repo: Arc<dyn RepoCollaborator>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl GraphNode for RepoAnalysis {
    fn name(&self) -> &str {
        nodes::REPO_ANALYSIS
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if !state.repo_prepared {
            let path = self
                .repo
                .prepare()
                .await
                .context("Failed to prepare the repository")?;
            log_info!("repository ready at {}", path.display());
            state.repo_path = Some(path);
            state.repo_prepared = true;
        }

        let repo_path = state
            .repo_path
            .clone()
            .context("Repository prepared without a path")?;
        let data = self
            .repo
            .analyze(&repo_path)
            .await
            .context("Failed to analyze the repository")?;

        state.repo_metadata = Some(json!({
            "analyzed_at": Utc::now(),
            "repo_url": state.repo_url,
        }));
        state.repo_data = Some(data);
        state.record_decision(nodes::REPO_ANALYSIS, "repository prepared and analyzed");
        Ok(())
    }

    fn route(&self, _state: &WorkflowState) -> Transition {
        Transition::Next(nodes::PLANNER.to_string())
    }
}
