//! Contributing-guide generation for repositories that lack one.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolSet;
use crate::error::TaskFailure;
use crate::operation::{Operation, TaskFn};
use crate::ops::str_arg;
use crate::task::TaskArgs;

pub fn generate_contributing() -> Operation {
    Operation::builder("generate_contributing")
        .description("Add a CONTRIBUTING.md to repositories missing one")
        .priority(20)
        .applicable_when(|state| {
            state.repo_analyzed() && state.repo_fact("has_contributing") == Some(&json!(false))
        })
        .function(Arc::new(ContributingFn))
        .depends_on("output_dir")
        .reads_state("repo_data")
        .task(
            "contributing:write",
            "Write CONTRIBUTING.md",
            TaskArgs::new(),
        )
        .build()
}

struct ContributingFn;

#[async_trait]
impl TaskFn for ContributingFn {
    async fn call(&self, _tools: &ToolSet, args: TaskArgs) -> Result<Value, TaskFailure> {
        let name = args
            .get("repo_data")
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("this project");

        let content = render_guide(name);

        let output_dir = str_arg(&args, "output_dir")?;
        let path = PathBuf::from(output_dir).join("CONTRIBUTING.md");
        std::fs::write(&path, content)
            .map_err(|e| TaskFailure::new(format!("failed to write {}: {}", path.display(), e)))?;

        Ok(json!({
            "result": {"path": path},
            "events": [format!("wrote {}", path.display())],
        }))
    }
}

fn render_guide(name: &str) -> String {
    format!(
        "# Contributing to {name}\n\n\
         Thank you for your interest in contributing!\n\n\
         ## Getting started\n\n\
         1. Fork the repository and create a feature branch.\n\
         2. Make your changes with tests where applicable.\n\
         3. Open a pull request describing what changed and why.\n\n\
         ## Reporting issues\n\n\
         Please open an issue with steps to reproduce and the behavior you expected.\n"
    )
}
