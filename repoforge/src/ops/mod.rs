//! Builtin repository-improvement operations.
//!
//! Each operation declares its applicability, priority, execution descriptor,
//! and static task expansion. Executors receive their collaborator handles
//! (`doc_generator`, `workflow_generator`) and the `output_dir` default from
//! the execution context, repository facts and earlier artifacts from the
//! workflow state, and per-task arguments from the plan itself.

mod ci;
mod contributing;
mod readme;

pub use ci::generate_ci_workflow;
pub use contributing::generate_contributing;
pub use readme::generate_readme;

use serde_json::Value;

use crate::error::{ConfigError, TaskFailure};
use crate::registry::OperationRegistry;
use crate::task::TaskArgs;

/// The full builtin catalog, in registration order
pub fn builtin_registry() -> Result<OperationRegistry, ConfigError> {
    let mut registry = OperationRegistry::new();
    registry.register(readme::generate_readme())?;
    registry.register(ci::generate_ci_workflow())?;
    registry.register(contributing::generate_contributing())?;
    Ok(registry)
}

pub(crate) fn str_arg(args: &TaskArgs, key: &str) -> Result<String, TaskFailure> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TaskFailure::new(format!("missing string argument '{}'", key)))
}

/// Result of an earlier task in the same plan, read from the injected
/// `artifacts` state attribute
pub(crate) fn artifact_result(args: &TaskArgs, task_id: &str) -> Result<Value, TaskFailure> {
    args.get("artifacts")
        .and_then(|a| a.get(task_id))
        .and_then(|a| a.get("result"))
        .cloned()
        .ok_or_else(|| {
            TaskFailure::new(format!("no artifact result from earlier task '{}'", task_id))
        })
}
