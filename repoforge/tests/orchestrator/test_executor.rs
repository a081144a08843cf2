//! Tests for the task executor: partial failure, argument merging, and
//! configuration-error behavior

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::common::*;
use repoforge::context::{ExecutionContext, ToolSet};
use repoforge::error::TaskFailure;
use repoforge::executor::TaskExecutor;
use repoforge::graph::{GraphNode, Transition};
use repoforge::operation::{Operation, TaskFn};
use repoforge::registry::OperationRegistry;
use repoforge::task::{Task, TaskArgs, TaskStatus};

/// Executor that reflects its merged arguments back as the task result
struct CaptureFn;

#[async_trait]
impl TaskFn for CaptureFn {
    async fn call(&self, _tools: &ToolSet, args: TaskArgs) -> Result<Value, TaskFailure> {
        Ok(json!({"result": Value::Object(args)}))
    }
}

fn plan_from(registry: &OperationRegistry, names: &[&str]) -> Vec<Task> {
    names
        .iter()
        .flat_map(|name| registry.get(name).unwrap().plan_tasks())
        .collect()
}

#[tokio::test]
async fn test_one_failing_task_does_not_stop_the_plan() {
    let mut registry = OperationRegistry::new();
    registry.register(exploding_op("fail", 0)).unwrap();
    registry.register(echo_op("ok", 1)).unwrap();
    let registry = Arc::new(registry);

    let mut state = analyzed_state();
    state.plan = plan_from(&registry, &["fail", "ok"]);

    let executor = TaskExecutor::new(registry, ExecutionContext::new());
    executor.run(&mut state).await.unwrap();

    assert_eq!(state.plan[0].status, TaskStatus::Failed);
    assert_eq!(state.plan[0].result, Some(json!({"error": "boom"})));
    assert_eq!(state.plan[1].status, TaskStatus::Completed);
    assert_eq!(state.plan[1].result, Some(json!({"op": "ok"})));

    // Both tasks left an artifact, failed or not
    assert_eq!(state.artifacts.len(), 2);
    assert!(state.artifacts.contains_key("fail:run"));
    assert!(state.artifacts.contains_key("ok:run"));

    assert!(state
        .session_memory
        .iter()
        .any(|d| d.summary.contains("1/2 tasks completed")));
    assert_eq!(executor.route(&state), Transition::Next("reviewer".to_string()));
}

#[tokio::test]
async fn test_terminal_tasks_are_never_redriven() {
    let mut registry = OperationRegistry::new();
    registry.register(exploding_op("fail", 0)).unwrap();
    registry.register(echo_op("ok", 1)).unwrap();
    let registry = Arc::new(registry);

    let mut state = analyzed_state();
    state.plan = plan_from(&registry, &["fail", "ok"]);

    let executor = TaskExecutor::new(registry, ExecutionContext::new());
    executor.run(&mut state).await.unwrap();
    let first_statuses: Vec<TaskStatus> = state.plan.iter().map(|t| t.status).collect();
    let decisions = state.session_memory.len();

    // A second pass finds no pending work; nothing moves backwards
    executor.run(&mut state).await.unwrap();
    let second_statuses: Vec<TaskStatus> = state.plan.iter().map(|t| t.status).collect();
    assert_eq!(first_statuses, second_statuses);
    assert_eq!(state.artifacts.len(), 2);
    assert_eq!(state.session_memory.len(), decisions + 1);
    assert!(state.current_step_index.is_none());
}

#[tokio::test]
async fn test_argument_merge_precedence() {
    let mut override_args = TaskArgs::new();
    override_args.insert("flavor".to_string(), json!("from_task"));

    let op = Operation::builder("capture")
        .function(Arc::new(CaptureFn))
        .depends_on("flavor")
        .depends_on("output_dir")
        .reads_state("repo_url")
        .task("capture:defaults", "No overrides", TaskArgs::new())
        .task("capture:override", "Task-level override", override_args)
        .build();

    let mut registry = OperationRegistry::new();
    registry.register(op).unwrap();
    let registry = Arc::new(registry);

    let mut state = analyzed_state();
    state.plan = plan_from(&registry, &["capture"]);

    let context = ExecutionContext::new()
        .with_value("flavor", json!("from_context"))
        .with_value("output_dir", json!("/tmp/out"));
    let executor = TaskExecutor::new(registry, context);
    executor.run(&mut state).await.unwrap();

    // Context value survives when nothing overrides it; state is injected
    let defaults = state.plan[0].result.as_ref().unwrap();
    assert_eq!(defaults["flavor"], "from_context");
    assert_eq!(defaults["output_dir"], "/tmp/out");
    assert_eq!(defaults["repo_url"], "https://example.com/sample.git");

    // An explicit task argument beats the injected default
    let overridden = state.plan[1].result.as_ref().unwrap();
    assert_eq!(overridden["flavor"], "from_task");
}

#[tokio::test]
async fn test_missing_context_dependency_aborts_the_run() {
    let op = Operation::builder("needy")
        .function(Arc::new(CaptureFn))
        .depends_on("nonexistent_service")
        .task("needy:run", "Needs a missing dependency", TaskArgs::new())
        .build();

    let mut registry = OperationRegistry::new();
    registry.register(op).unwrap();
    let registry = Arc::new(registry);

    let mut state = analyzed_state();
    state.plan = plan_from(&registry, &["needy"]);

    let executor = TaskExecutor::new(registry, ExecutionContext::new());
    let err = executor.run(&mut state).await.unwrap_err();
    assert!(err.to_string().contains("nonexistent_service"));
}

#[tokio::test]
async fn test_unknown_task_provenance_aborts_the_run() {
    let registry = Arc::new(sample_registry());

    let mut state = analyzed_state();
    state.plan = vec![Task::new("ghost:run", "ghost_operation", "From nowhere")];

    let executor = TaskExecutor::new(registry, ExecutionContext::new());
    let err = executor.run(&mut state).await.unwrap_err();
    assert!(err.to_string().contains("ghost_operation"));
}
