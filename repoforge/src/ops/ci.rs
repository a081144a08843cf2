//! CI workflow generation: render a workflow file for the repository's
//! toolchain, then write it under `.github/workflows/`.
//!
//! Function-style operation: one callable handles both tasks, selected by
//! the task's `step` argument.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolSet;
use crate::error::TaskFailure;
use crate::operation::{Operation, TaskFn};
use crate::ops::{artifact_result, str_arg};
use crate::task::TaskArgs;

pub fn generate_ci_workflow() -> Operation {
    Operation::builder("generate_ci_workflow")
        .description("Generate a continuous-integration workflow for the repository")
        .priority(0)
        .applicable_when(|state| state.repo_analyzed())
        .function(Arc::new(CiFn))
        .depends_on("workflow_generator")
        .depends_on("output_dir")
        .reads_state("repo_data")
        .reads_state("artifacts")
        .task("ci:render", "Render CI workflow", step_args("render"))
        .task("ci:write", "Write CI workflow file", step_args("write"))
        .build()
}

fn step_args(step: &str) -> TaskArgs {
    let mut args = TaskArgs::new();
    args.insert("step".to_string(), json!(step));
    args
}

struct CiFn;

#[async_trait]
impl TaskFn for CiFn {
    async fn call(&self, tools: &ToolSet, args: TaskArgs) -> Result<Value, TaskFailure> {
        match str_arg(&args, "step")?.as_str() {
            "render" => {
                let generator = tools.require("workflow_generator")?;
                // The generator already returns the {result, events} shape
                generator.call(&args).await
            }
            "write" => write_workflow(&args),
            other => Err(TaskFailure::new(format!("unknown ci step '{}'", other))),
        }
    }
}

fn write_workflow(args: &TaskArgs) -> Result<Value, TaskFailure> {
    let content = artifact_result(args, "ci:render")?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TaskFailure::new("ci:render produced no workflow text"))?;

    let output_dir = str_arg(args, "output_dir")?;
    let workflows = PathBuf::from(output_dir).join(".github").join("workflows");
    std::fs::create_dir_all(&workflows)
        .map_err(|e| TaskFailure::new(format!("failed to create {}: {}", workflows.display(), e)))?;

    let path = workflows.join("ci.yml");
    std::fs::write(&path, content)
        .map_err(|e| TaskFailure::new(format!("failed to write {}: {}", path.display(), e)))?;

    Ok(json!({
        "result": {"path": path},
        "events": [format!("wrote {}", path.display())],
    }))
}
