//! Error taxonomy for the orchestration core.
//!
//! Three failure classes with very different handling:
//!
//! 1. **Configuration errors** ([`ConfigError`]) - wiring bugs between the
//!    registry, graph, and executor. Fatal; abort the run with a message
//!    naming the offending operation or task.
//! 2. **Task failures** ([`TaskFailure`]) - recovered locally by the
//!    executor; the task is marked failed and the plan continues.
//! 3. **Model errors** (`model::ModelError`) - retryable; the planner backs
//!    off and ultimately degrades to an empty plan.

use thiserror::Error;

use crate::task::TaskOutput;

/// Fatal wiring errors. A retry never fixes these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("task '{task_id}' claims provenance from unregistered operation '{operation}'")]
    UnknownTaskProvenance { task_id: String, operation: String },

    #[error("operation '{operation}' uses a class-style executor but sets no method")]
    MissingMethod { operation: String },

    #[error("operation '{operation}' is function-style but sets method '{method}'")]
    UnexpectedMethod { operation: String, method: String },

    #[error("executor dependency '{name}' is missing from the execution context (operation '{operation}')")]
    MissingDependency { name: String, operation: String },

    #[error("operation '{name}' is already registered")]
    DuplicateOperation { name: String },

    #[error("graph node '{node}' routed to unknown node '{target}'")]
    UnknownRoute { node: String, target: String },

    #[error("graph has no node named '{name}'")]
    MissingNode { name: String },
}

/// A task-level failure, caught by the executor.
///
/// A failure may carry a "soft" payload shaped like a normal task output;
/// the executor preserves it in the artifact instead of synthesizing an
/// `{error: message}` result.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskFailure {
    pub message: String,
    pub output: Option<TaskOutput>,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: None,
        }
    }

    /// A soft failure that still produced a usable partial output
    pub fn with_output(message: impl Into<String>, output: TaskOutput) -> Self {
        Self {
            message: message.into(),
            output: Some(output),
        }
    }
}
