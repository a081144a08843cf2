//! README generation: collect facts, render markdown, write the file.
//!
//! Class-style operation: each task constructs a [`ReadmeJob`] from the
//! merged arguments and invokes its `run` method; the task's `step` argument
//! selects the stage.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::{Tool, ToolSet};
use crate::error::TaskFailure;
use crate::operation::{Operation, TaskFactory, TaskInstance};
use crate::ops::{artifact_result, str_arg};
use crate::task::TaskArgs;

pub fn generate_readme() -> Operation {
    Operation::builder("generate_readme")
        .description("Generate or refresh the repository README from its analyzed facts")
        .priority(10)
        .applicable_when(|state| state.repo_analyzed())
        .class(Arc::new(ReadmeFactory), "run")
        .depends_on("doc_generator")
        .depends_on("output_dir")
        .reads_state("repo_data")
        .reads_state("artifacts")
        .task("readme:collect", "Collect repository facts", step_args("collect"))
        .task("readme:render", "Render README markdown", step_args("render"))
        .task("readme:write", "Write README.md", step_args("write"))
        .build()
}

fn step_args(step: &str) -> TaskArgs {
    let mut args = TaskArgs::new();
    args.insert("step".to_string(), json!(step));
    args
}

struct ReadmeFactory;

impl TaskFactory for ReadmeFactory {
    fn construct(&self, tools: &ToolSet, args: TaskArgs) -> Result<Box<dyn TaskInstance>, TaskFailure> {
        let doc_generator = tools.require("doc_generator")?;
        let step = str_arg(&args, "step")?;
        Ok(Box::new(ReadmeJob {
            doc_generator,
            step,
            args,
        }))
    }
}

struct ReadmeJob {
    doc_generator: Arc<dyn Tool>,
    step: String,
    args: TaskArgs,
}

impl ReadmeJob {
    async fn collect(&self) -> Result<Value, TaskFailure> {
        let facts = self.doc_generator.call(&self.tool_args("collect", None)).await?;
        Ok(json!({
            "result": facts,
            "events": ["collected repository facts"],
        }))
    }

    async fn render(&self) -> Result<Value, TaskFailure> {
        let facts = artifact_result(&self.args, "readme:collect")?;
        let rendered = self
            .doc_generator
            .call(&self.tool_args("render", Some(facts)))
            .await?;
        Ok(json!({
            "result": {"content": rendered},
            "events": ["rendered readme markdown"],
        }))
    }

    fn write(&self) -> Result<Value, TaskFailure> {
        let content = artifact_result(&self.args, "readme:render")?
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TaskFailure::new("readme:render produced no content"))?;

        let output_dir = str_arg(&self.args, "output_dir")?;
        let path = PathBuf::from(output_dir).join("README.md");
        std::fs::write(&path, content)
            .map_err(|e| TaskFailure::new(format!("failed to write {}: {}", path.display(), e)))?;

        Ok(json!({
            "result": {"path": path},
            "events": [format!("wrote {}", path.display())],
        }))
    }

    fn tool_args(&self, mode: &str, facts: Option<Value>) -> TaskArgs {
        let mut args = TaskArgs::new();
        args.insert("mode".to_string(), json!(mode));
        if let Some(repo_data) = self.args.get("repo_data") {
            args.insert("repo_data".to_string(), repo_data.clone());
        }
        if let Some(facts) = facts {
            args.insert("facts".to_string(), facts);
        }
        args
    }
}

#[async_trait]
impl TaskInstance for ReadmeJob {
    async fn invoke(&self, method: &str) -> Result<Value, TaskFailure> {
        if method != "run" {
            return Err(TaskFailure::new(format!(
                "readme job has no method '{}'",
                method
            )));
        }
        match self.step.as_str() {
            "collect" => self.collect().await,
            "render" => self.render().await,
            "write" => self.write(),
            other => Err(TaskFailure::new(format!("unknown readme step '{}'", other))),
        }
    }
}
