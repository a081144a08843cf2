//! Task executor: drives every pending task in the plan, in index order, to
//! completion or failure, persisting artifacts.
//!
//! The partial-failure contract: a single task's failure never stops the
//! loop, so the run always reaches the reviewer with a best-effort artifact
//! set. Configuration failures are different - they indicate a wiring bug
//! between registry and executor and abort the run immediately.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::{log_task_complete, log_task_failed, log_task_start};
use serde_json::{json, Value};

use crate::context::{ContextEntry, ExecutionContext, ToolSet};
use crate::error::{ConfigError, TaskFailure};
use crate::graph::{GraphNode, Transition};
use crate::nodes;
use crate::operation::{ExecutionDescriptor, ExecutorKind};
use crate::registry::OperationRegistry;
use crate::state::WorkflowState;
use crate::task::{TaskArgs, TaskOutput, TaskStatus};

pub struct TaskExecutor {
    registry: Arc<OperationRegistry>,
    context: ExecutionContext,
}

impl TaskExecutor {
    pub fn new(registry: Arc<OperationRegistry>, context: ExecutionContext) -> Self {
        Self { registry, context }
    }

    /// Build the call arguments from three sources with increasing
    /// precedence: context values < state attributes < explicit task args.
    /// Tool handles named in `dependencies` are resolved alongside.
    fn merge_args(
        &self,
        descriptor: &ExecutionDescriptor,
        state: &WorkflowState,
        task_index: usize,
        operation: &str,
    ) -> Result<(TaskArgs, ToolSet), ConfigError> {
        let mut args = TaskArgs::new();
        let mut tools = ToolSet::default();

        for name in &descriptor.dependencies {
            match self.context.get(name) {
                Some(ContextEntry::Value(value)) => {
                    args.insert(name.clone(), value.clone());
                }
                Some(ContextEntry::Tool(tool)) => {
                    tools.insert(name.clone(), tool.clone());
                }
                None => {
                    return Err(ConfigError::MissingDependency {
                        name: name.clone(),
                        operation: operation.to_string(),
                    });
                }
            }
        }

        for name in &descriptor.state_dependencies {
            if let Some(value) = state_attribute(state, name) {
                args.insert(name.clone(), value);
            }
        }

        // A task can always override an injected default
        for (key, value) in &state.plan[task_index].args {
            args.insert(key.clone(), value.clone());
        }

        Ok((args, tools))
    }
}

/// Dispatch one task invocation. The outer error aborts the run; the inner
/// one is a recoverable task failure.
async fn dispatch(
    descriptor: &ExecutionDescriptor,
    operation: &str,
    tools: &ToolSet,
    args: TaskArgs,
) -> Result<Result<Value, TaskFailure>, ConfigError> {
    match &descriptor.kind {
        ExecutorKind::Function(executor) => {
            if let Some(method) = &descriptor.method {
                return Err(ConfigError::UnexpectedMethod {
                    operation: operation.to_string(),
                    method: method.clone(),
                });
            }
            Ok(executor.call(tools, args).await)
        }
        ExecutorKind::Class(factory) => {
            let method = descriptor
                .method
                .as_ref()
                .ok_or_else(|| ConfigError::MissingMethod {
                    operation: operation.to_string(),
                })?;
            match factory.construct(tools, args) {
                Ok(instance) => Ok(instance.invoke(method).await),
                // A raising constructor is a task failure, not a wiring bug
                Err(failure) => Ok(Err(failure)),
            }
        }
    }
}

/// Pull a named attribute out of the workflow state for injection
fn state_attribute(state: &WorkflowState, name: &str) -> Option<Value> {
    match name {
        "session_id" => Some(json!(state.session_id)),
        "repo_url" => Some(json!(state.repo_url)),
        "user_request" => Some(json!(state.user_request)),
        "attachment" => state.attachment.as_ref().map(|a| json!(a)),
        "intent" => state.intent.as_ref().map(|i| json!(i)),
        "task_scope" => state.task_scope.as_ref().map(|s| json!(s)),
        "repo_path" => state.repo_path.as_ref().map(|p| json!(p)),
        "repo_data" => state.repo_data.clone(),
        "repo_metadata" => state.repo_metadata.clone(),
        "artifacts" => serde_json::to_value(&state.artifacts).ok(),
        _ => None,
    }
}

#[async_trait]
impl GraphNode for TaskExecutor {
    fn name(&self) -> &str {
        nodes::EXECUTOR
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let total = state.plan.len();

        for idx in 0..total {
            // Skip anything already driven; supports re-entry after a
            // partially executed run
            if state.plan[idx].status != TaskStatus::Pending {
                continue;
            }

            state.current_step_index = Some(idx);
            state.plan[idx].status = TaskStatus::InProgress;

            let task_id = state.plan[idx].id.clone();
            let description = state.plan[idx].description.clone();
            let operation = state.plan[idx].operation.clone();
            log_task_start!(task_id, description, idx + 1, total);

            // Steps 3-5: resolve, merge, dispatch. Configuration errors
            // abort the whole run here.
            let descriptor = self.registry.descriptor_for(&state.plan[idx])?.clone();
            let (args, tools) = self.merge_args(&descriptor, state, idx, &operation)?;
            let outcome = dispatch(&descriptor, &operation, &tools, args).await?;

            let output = match outcome {
                Ok(raw) => {
                    let output = TaskOutput::normalize(raw);
                    state.plan[idx].status = TaskStatus::Completed;
                    log_task_complete!(task_id, output.events.clone());
                    output
                }
                Err(failure) => {
                    // Soft failures keep their payload; everything else gets
                    // a synthesized error result
                    let output = failure.output.clone().unwrap_or_else(|| TaskOutput {
                        result: Some(json!({"error": failure.message})),
                        events: Vec::new(),
                    });
                    state.plan[idx].status = TaskStatus::Failed;
                    log_task_failed!(task_id, failure.message);
                    output
                }
            };

            state.plan[idx].result = output.result.clone();
            state.plan[idx].events = output.events.clone();
            state.artifacts.insert(task_id, output);
        }

        state.current_step_index = None;
        let completed = state
            .plan
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        state.record_decision(
            nodes::EXECUTOR,
            format!("executed plan: {}/{} tasks completed", completed, total),
        );
        Ok(())
    }

    fn route(&self, _state: &WorkflowState) -> Transition {
        Transition::Next(nodes::REVIEWER.to_string())
    }
}
