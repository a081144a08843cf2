//! Planner: asks the model to select operations, then builds the plan
//! deterministically.
//!
//! The model only ever chooses *which* applicable operations to run; the
//! resulting task order comes from the registry's own priorities with
//! registration order as the tie-break. Two runs with the same model output
//! and the same registry always yield the same plan.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::{log_info, log_warning, RunLog};

use crate::graph::{GraphNode, Transition};
use crate::model::{validate_decision, ModelError, ModelService, PlanDecision, RetryPolicy};
use crate::nodes;
use crate::operation::Operation;
use crate::registry::OperationRegistry;
use crate::state::{WorkflowState, WorkflowStatus};
use crate::task::Task;

const SYSTEM_PROMPT: &str = "You select repository-improvement operations. \
Respond with JSON: {\"operations\": [string], \"reasoning\": string}. \
Only use operation names from the provided list.";

pub struct Planner {
    registry: Arc<OperationRegistry>,
    model: Arc<dyn ModelService>,
    retry: RetryPolicy,
}

impl Planner {
    pub fn new(
        registry: Arc<OperationRegistry>,
        model: Arc<dyn ModelService>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            model,
            retry,
        }
    }

    /// The decision space offered to the model: applicable operation names
    /// and descriptions only
    fn build_prompt(state: &WorkflowState, applicable: &[&Operation]) -> String {
        let mut prompt = format!(
            "User request: {}\nIntent: {} (scope: {})\n\nApplicable operations:\n",
            state.user_request,
            state.intent.as_deref().unwrap_or("unclassified"),
            state.task_scope.as_deref().unwrap_or("unspecified"),
        );
        for op in applicable {
            prompt.push_str(&format!("- {}: {}\n", op.name, op.description));
        }
        if let Some(repo_data) = &state.repo_data {
            prompt.push_str(&format!(
                "\nRepository facts:\n{}\n",
                serde_json::to_string_pretty(repo_data).unwrap_or_else(|_| "{}".to_string())
            ));
        }
        prompt.push_str("\nSelect the operations that satisfy the request.");
        prompt
    }

    /// Drop model-returned names outside the offered decision space and
    /// duplicates. The model's output is untrusted: it picks the set, never
    /// the order, so the result walks the applicable list (registration
    /// order), not the selection.
    fn filter_selection<'a>(
        selection: &[String],
        applicable: &[&'a Operation],
    ) -> Vec<&'a Operation> {
        let mut requested = std::collections::HashSet::new();
        for name in selection {
            if !requested.insert(name.as_str()) {
                continue;
            }
            if !applicable.iter().any(|op| &op.name == name) {
                log_warning!("planner selected unknown operation '{}', dropped", name);
            }
        }
        applicable
            .iter()
            .filter(|op| requested.contains(op.name.as_str()))
            .copied()
            .collect()
    }

    /// Expand the selection into the plan, in registry-priority order
    fn expand(mut selected: Vec<&Operation>) -> Vec<Task> {
        // Stable sort over registration order: equal priorities keep it
        selected.sort_by_key(|op| op.priority);
        selected.iter().flat_map(|op| op.plan_tasks()).collect()
    }
}

#[async_trait]
impl GraphNode for Planner {
    fn name(&self) -> &str {
        nodes::PLANNER
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let applicable = self.registry.applicable(state);

        if applicable.is_empty() {
            log_warning!("no operations are applicable; planning an empty run");
            state.plan = Vec::new();
            state.current_step_index = None;
            state.status = WorkflowStatus::Generating;
            state.record_decision(nodes::PLANNER, "no applicable operations; empty plan");
            return Ok(());
        }

        let prompt = Self::build_prompt(state, &applicable);
        let decision = self
            .retry
            .run(|| async {
                let raw = self
                    .model
                    .run_structured_decision(&prompt, SYSTEM_PROMPT)
                    .await?;
                let decision: PlanDecision = validate_decision(raw)?;
                if decision.operations.is_empty() {
                    return Err(ModelError::Schema(
                        "decision named no operations".to_string(),
                    ));
                }
                Ok(decision)
            })
            .await;

        match decision {
            Ok(decision) => {
                let selected = Self::filter_selection(&decision.operations, &applicable);
                let names: Vec<String> = selected.iter().map(|op| op.name.clone()).collect();
                let plan = Self::expand(selected);

                log_info!(
                    "plan: {} operation(s), {} task(s)",
                    names.len(),
                    plan.len()
                );
                RunLog::PlanCreated {
                    operations: names.clone(),
                    task_count: plan.len(),
                    reasoning: decision.reasoning.clone(),
                }
                .emit();
                state.record_decision(
                    nodes::PLANNER,
                    format!(
                        "selected operations [{}]: {}",
                        names.join(", "),
                        decision.reasoning
                    ),
                );

                state.current_step_index = if plan.is_empty() { None } else { Some(0) };
                state.plan = plan;
                state.status = WorkflowStatus::Generating;
            }
            Err(err) => {
                // Exhausted retries degrade to an empty plan - a legitimate
                // no-op run, not a crash
                log_warning!("planning gave up after retries: {}", err);
                state.record_decision(
                    nodes::PLANNER,
                    format!("planning failed after retries ({}); empty plan", err),
                );
                state.plan = Vec::new();
                state.current_step_index = None;
                state.status = WorkflowStatus::Generating;
            }
        }

        Ok(())
    }

    fn route(&self, _state: &WorkflowState) -> Transition {
        Transition::Next(nodes::EXECUTOR.to_string())
    }
}
