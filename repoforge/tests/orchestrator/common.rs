//! Common test utilities for orchestrator tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use repoforge::collaborators::{Clarification, Clarifier, RepoCollaborator};
use repoforge::context::ToolSet;
use repoforge::error::TaskFailure;
use repoforge::model::{ModelError, ModelService};
use repoforge::operation::{Operation, TaskFactory, TaskFn, TaskInstance};
use repoforge::registry::OperationRegistry;
use repoforge::state::WorkflowState;
use repoforge::task::TaskArgs;

/// Create a temporary directory for testing
pub fn create_temp_dir(name: &str) -> PathBuf {
    let temp_dir = std::env::temp_dir().join(format!("orchestrator_test_{}", name));
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir).unwrap();
    temp_dir
}

/// Clean up temporary directory
pub fn cleanup_temp_dir(path: &PathBuf) {
    if path.exists() {
        std::fs::remove_dir_all(path).ok();
    }
}

/// A state with the repository already prepared and analyzed
pub fn analyzed_state() -> WorkflowState {
    let mut state = WorkflowState::new("https://example.com/sample.git", "improve the repo");
    state.repo_prepared = true;
    state.repo_path = Some(PathBuf::from("/tmp/sample"));
    state.repo_data = Some(json!({
        "name": "sample",
        "language": "rust",
        "dependencies": ["serde"],
        "has_readme": false,
        "has_contributing": false,
        "has_tests": true,
        "has_ci": false,
    }));
    state
}

/// Function-style executor that reports which operation ran
struct EchoFn {
    name: String,
}

#[async_trait]
impl TaskFn for EchoFn {
    async fn call(&self, _tools: &ToolSet, _args: TaskArgs) -> Result<Value, TaskFailure> {
        Ok(json!({
            "result": {"op": self.name},
            "events": [format!("{} ran", self.name)],
        }))
    }
}

/// Function-style operation with a single task, succeeding unconditionally
pub fn echo_op(name: &str, priority: i32) -> Operation {
    Operation::builder(name)
        .description(format!("Echo operation {}", name))
        .priority(priority)
        .function(Arc::new(EchoFn {
            name: name.to_string(),
        }))
        .task(format!("{}:run", name), format!("Run {}", name), TaskArgs::new())
        .build()
}

/// Factory whose constructor always raises
struct ExplodingFactory;

impl TaskFactory for ExplodingFactory {
    fn construct(
        &self,
        _tools: &ToolSet,
        _args: TaskArgs,
    ) -> Result<Box<dyn TaskInstance>, TaskFailure> {
        Err(TaskFailure::new("boom"))
    }
}

/// Class-style operation whose every task fails at construction
pub fn exploding_op(name: &str, priority: i32) -> Operation {
    Operation::builder(name)
        .description(format!("Exploding operation {}", name))
        .priority(priority)
        .class(Arc::new(ExplodingFactory), "run")
        .task(format!("{}:run", name), format!("Run {}", name), TaskArgs::new())
        .build()
}

/// Registry with two echo operations: ci (priority 0) and readme (priority 1)
pub fn sample_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();
    registry.register(echo_op("readme", 1)).unwrap();
    registry.register(echo_op("ci", 0)).unwrap();
    registry
}

/// Model service that fails every call
pub struct FailingModelService;

#[async_trait]
impl ModelService for FailingModelService {
    async fn run_structured_decision(
        &self,
        _prompt: &str,
        _system_prompt: &str,
    ) -> Result<Value, ModelError> {
        Err(ModelError::Backend("model backend is down".to_string()))
    }
}

/// Repo collaborator that serves fixed facts for a fixed path
pub struct StaticRepo {
    pub path: PathBuf,
    pub facts: Value,
}

#[async_trait]
impl RepoCollaborator for StaticRepo {
    async fn prepare(&self) -> anyhow::Result<PathBuf> {
        Ok(self.path.clone())
    }

    async fn analyze(&self, _repo_path: &Path) -> anyhow::Result<Value> {
        Ok(self.facts.clone())
    }
}

/// Clarifier that always answers with the same canned elaboration
pub struct CannedClarifier {
    pub answer: String,
}

#[async_trait]
impl Clarifier for CannedClarifier {
    async fn prompt_user(&self) -> anyhow::Result<Clarification> {
        Ok(Clarification {
            user_request: self.answer.clone(),
            attachment: None,
        })
    }
}
