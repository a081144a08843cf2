//! Top-level workflow assembly.
//!
//! Wires the node graph, the builtin operation catalog, and the collaborator
//! implementations into one runnable workflow, driven by a [`WorkflowConfig`]
//! derived from CLI arguments.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use repoforge_sdk::log_file_saved;
use serde_json::json;

use crate::cli::Args;
use crate::collaborators::{Clarifier, LocalRepo, RepoCollaborator, StdinClarifier};
use crate::context::ExecutionContext;
use crate::executor::TaskExecutor;
use crate::model::{ModelService, RetryPolicy, ScriptedModelService};
use crate::nodes::{
    ApproveAll, Finalizer, IntentRouter, Planner, RepoAnalysis, Reviewer, INTENT_ROUTER,
};
use crate::ops::builtin_registry;
use crate::registry::OperationRegistry;
use crate::state::WorkflowState;
use crate::tools::{DocGenerator, WorkflowGenerator};

/// Workflow configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Local path of the repository to improve
    pub repo_path: PathBuf,

    /// URL recorded in the run state; defaults to the local path
    pub repo_url: String,

    /// The user's improvement request
    pub request: String,

    /// Decision script replayed by the model service
    pub decisions_path: PathBuf,

    /// Where generated files are written; defaults to the repository itself
    pub output_dir: PathBuf,

    /// Retry budget for model calls
    pub retry: RetryPolicy,

    /// Reviewer rejections tolerated before the run errors out
    pub max_replan_cycles: usize,

    /// Optional path for the YAML run report
    pub report_path: Option<PathBuf>,

    /// Enable debug output
    pub debug: bool,
}

impl From<Args> for WorkflowConfig {
    fn from(args: Args) -> Self {
        let repo = args.repo.clone().unwrap_or_default();
        let repo_path = PathBuf::from(&repo);
        let repo_url = args.repo_url.clone().unwrap_or_else(|| repo.clone());
        let output_dir = args
            .output_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| repo_path.clone());

        WorkflowConfig {
            repo_path,
            repo_url,
            request: args.request.clone().unwrap_or_default(),
            decisions_path: PathBuf::from(args.decisions.as_deref().unwrap_or_default()),
            output_dir,
            retry: RetryPolicy {
                max_retries: args.max_retries,
                base_delay: Duration::from_millis(args.retry_base_ms),
            },
            max_replan_cycles: args.max_replan_cycles,
            report_path: args.report.clone().map(PathBuf::from),
            debug: args.debug,
        }
    }
}

/// The collaborator set injected into the graph
pub struct Collaborators {
    pub model: Arc<dyn ModelService>,
    pub repo: Arc<dyn RepoCollaborator>,
    pub clarifier: Arc<dyn Clarifier>,
}

/// Default execution context: the output directory plus the builtin
/// generator tools the operation catalog depends on
pub fn default_context(output_dir: &PathBuf) -> ExecutionContext {
    ExecutionContext::new()
        .with_value("output_dir", json!(output_dir.to_string_lossy()))
        .with_tool("doc_generator", Arc::new(DocGenerator))
        .with_tool("workflow_generator", Arc::new(WorkflowGenerator))
}

/// Assemble the full node graph around a registry and collaborator set
pub fn build_graph(
    registry: Arc<OperationRegistry>,
    collaborators: Collaborators,
    context: ExecutionContext,
    retry: RetryPolicy,
    max_replan_cycles: usize,
) -> crate::graph::WorkflowGraph {
    crate::graph::WorkflowGraph::new(INTENT_ROUTER)
        .with_node(Arc::new(IntentRouter::new(
            collaborators.model.clone(),
            collaborators.clarifier,
            retry,
        )))
        .with_node(Arc::new(RepoAnalysis::new(collaborators.repo)))
        .with_node(Arc::new(Planner::new(
            registry.clone(),
            collaborators.model,
            retry,
        )))
        .with_node(Arc::new(TaskExecutor::new(registry, context)))
        .with_node(Arc::new(Reviewer::new(Arc::new(ApproveAll), max_replan_cycles)))
        .with_node(Arc::new(Finalizer))
}

/// Run the repository-improvement workflow end to end
pub async fn run_repoforge_workflow(config: WorkflowConfig) -> Result<WorkflowState> {
    let registry = Arc::new(builtin_registry()?);
    let model = ScriptedModelService::from_yaml_file(&config.decisions_path)?;

    let collaborators = Collaborators {
        model: Arc::new(model),
        repo: Arc::new(LocalRepo::new(&config.repo_path)),
        clarifier: Arc::new(StdinClarifier),
    };

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let graph = build_graph(
        registry,
        collaborators,
        default_context(&config.output_dir),
        config.retry,
        config.max_replan_cycles,
    );

    let state = graph
        .run(WorkflowState::new(&config.repo_url, &config.request))
        .await?;

    if let Some(report_path) = &config.report_path {
        save_run_report(&state, report_path)?;
    }

    Ok(state)
}

/// Persist the final state as a YAML run report
fn save_run_report(state: &WorkflowState, path: &PathBuf) -> Result<()> {
    let yaml = serde_yaml::to_string(state).context("Failed to serialize the run report")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;
    log_file_saved!(path.display());
    Ok(())
}
