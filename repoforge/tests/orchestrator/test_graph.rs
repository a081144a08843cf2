//! Tests for graph-level behavior: confidence gating with clarification,
//! and the review-rejection loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::common::*;
use repoforge::context::ExecutionContext;
use repoforge::executor::TaskExecutor;
use repoforge::graph::{GraphNode, Transition, WorkflowGraph};
use repoforge::model::{RetryPolicy, ScriptedModelService};
use repoforge::nodes::{Finalizer, IntentRouter, Planner, ReviewPolicy, Reviewer};
use repoforge::state::{WorkflowState, WorkflowStatus};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_low_confidence_waits_for_the_user() {
    let model = Arc::new(ScriptedModelService::new(vec![json!({
        "intent": "new_task",
        "task_scope": "docs",
        "confidence": 0.3,
    })]));
    let router = IntentRouter::new(
        model,
        Arc::new(CannedClarifier {
            answer: "never consulted here".to_string(),
        }),
        fast_retry(),
    );

    let mut state = WorkflowState::new("repo", "do something");
    router.run(&mut state).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::WaitingForUser);
    assert_eq!(state.intent_confidence, Some(0.3));
    // The gate loops the router back to itself
    assert_eq!(
        router.route(&state),
        Transition::Next("intent_router".to_string())
    );
}

#[tokio::test]
async fn test_confident_intent_proceeds_to_analysis() {
    let model = Arc::new(ScriptedModelService::new(vec![json!({
        "intent": "new_task",
        "task_scope": "docs",
        "confidence": 0.9,
    })]));
    let router = IntentRouter::new(
        model,
        Arc::new(CannedClarifier {
            answer: String::new(),
        }),
        fast_retry(),
    );

    let mut state = WorkflowState::new("repo", "refresh the readme");
    router.run(&mut state).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::Analyzing);
    assert_eq!(state.intent.as_deref(), Some("new_task"));
    assert_eq!(
        router.route(&state),
        Transition::Next("repo_analysis".to_string())
    );
}

#[tokio::test]
async fn test_clarification_loop_absorbs_the_answer_and_unblocks() {
    // First classification is unsure; after the clarification the second
    // one clears the gate, and planning proceeds
    let model: Arc<ScriptedModelService> = Arc::new(ScriptedModelService::new(vec![
        json!({"intent": "unknown", "task_scope": "", "confidence": 0.2}),
        json!({"intent": "new_task", "task_scope": "docs", "confidence": 0.95}),
        json!({"operations": ["ci", "readme"], "reasoning": "both requested"}),
    ]));
    let registry = Arc::new(sample_registry());

    let graph = repoforge::workflow::build_graph(
        registry,
        repoforge::workflow::Collaborators {
            model,
            repo: Arc::new(StaticRepo {
                path: "/tmp/sample".into(),
                facts: json!({"name": "sample", "language": "rust"}),
            }),
            clarifier: Arc::new(CannedClarifier {
                answer: "please add a readme and ci".to_string(),
            }),
        },
        ExecutionContext::new(),
        fast_retry(),
        3,
    );

    let state = graph
        .run(WorkflowState::new("https://example.com/sample.git", "fix it"))
        .await
        .unwrap();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert!(state.user_request.contains("fix it"));
    assert!(state.user_request.contains("please add a readme and ci"));
    assert_eq!(state.plan.len(), 2);
    assert_eq!(state.artifacts.len(), 2);
}

/// Policy that rejects the first plan, then approves
struct RejectOnce {
    rejected: AtomicBool,
}

#[async_trait]
impl ReviewPolicy for RejectOnce {
    async fn review(&self, _state: &WorkflowState) -> Result<bool> {
        Ok(self.rejected.swap(true, Ordering::SeqCst))
    }
}

#[tokio::test]
async fn test_rejected_review_replans_and_then_finishes() {
    let registry = Arc::new(sample_registry());
    // Two planning rounds: the reviewer rejects the first
    let model = Arc::new(ScriptedModelService::new(vec![
        json!({"operations": ["ci"], "reasoning": "first attempt"}),
        json!({"operations": ["ci", "readme"], "reasoning": "second attempt"}),
    ]));

    let graph = WorkflowGraph::new("planner")
        .with_node(Arc::new(Planner::new(
            registry.clone(),
            model,
            fast_retry(),
        )))
        .with_node(Arc::new(TaskExecutor::new(
            registry,
            ExecutionContext::new(),
        )))
        .with_node(Arc::new(Reviewer::new(
            Arc::new(RejectOnce {
                rejected: AtomicBool::new(false),
            }),
            3,
        )))
        .with_node(Arc::new(Finalizer));

    let state = graph.run(analyzed_state()).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.replan_cycles, 1);
    assert_eq!(state.approval, Some(true));
    // The second plan replaced the first
    let ids: Vec<&str> = state.plan.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["ci:run", "readme:run"]);
}
