//! Template-backed generator tools injected into task executors.
//!
//! These are the collaborator handles named by the builtin operations'
//! execution descriptors: `doc_generator` renders README content and
//! `workflow_generator` renders a CI workflow file, both from the repository
//! facts gathered during analysis.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::Tool;
use crate::error::TaskFailure;
use crate::task::TaskArgs;

/// Renders README markdown from repository facts.
///
/// Supports two modes: `collect` distills the analysis data into the facts
/// the renderer needs, `render` produces the markdown.
pub struct DocGenerator;

#[async_trait]
impl Tool for DocGenerator {
    async fn call(&self, args: &TaskArgs) -> Result<Value, TaskFailure> {
        let mode = str_arg(args, "mode")?;
        let repo_data = args
            .get("repo_data")
            .cloned()
            .ok_or_else(|| TaskFailure::new("doc_generator requires repo_data"))?;

        match mode.as_str() {
            "collect" => Ok(collect_facts(&repo_data)),
            "render" => {
                let facts = args.get("facts").unwrap_or(&repo_data);
                Ok(json!(render_readme(facts)))
            }
            other => Err(TaskFailure::new(format!(
                "doc_generator has no mode '{}'",
                other
            ))),
        }
    }
}

fn collect_facts(repo_data: &Value) -> Value {
    json!({
        "name": repo_data.get("name").cloned().unwrap_or(json!("repository")),
        "language": repo_data.get("language").cloned().unwrap_or(Value::Null),
        "dependencies": repo_data.get("dependencies").cloned().unwrap_or(json!([])),
        "has_tests": repo_data.get("has_tests").cloned().unwrap_or(json!(false)),
    })
}

fn render_readme(facts: &Value) -> String {
    let name = facts
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("repository");
    let language = facts.get("language").and_then(Value::as_str);

    let mut readme = format!("# {}\n\n", name);
    if let Some(language) = language {
        readme.push_str(&format!("A {} project.\n\n", language));
    }

    if let Some(deps) = facts.get("dependencies").and_then(Value::as_array) {
        if !deps.is_empty() {
            readme.push_str("## Dependencies\n\n");
            for dep in deps.iter().filter_map(Value::as_str) {
                readme.push_str(&format!("- {}\n", dep));
            }
            readme.push('\n');
        }
    }

    if facts.get("has_tests").and_then(Value::as_bool) == Some(true) {
        readme.push_str("## Testing\n\nRun the test suite before sending changes.\n");
    }

    readme
}

/// Renders a GitHub Actions workflow for the repository's language
pub struct WorkflowGenerator;

#[async_trait]
impl Tool for WorkflowGenerator {
    async fn call(&self, args: &TaskArgs) -> Result<Value, TaskFailure> {
        let repo_data = args
            .get("repo_data")
            .cloned()
            .ok_or_else(|| TaskFailure::new("workflow_generator requires repo_data"))?;
        let language = repo_data
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or("generic");

        Ok(json!({
            "result": render_workflow(language),
            "events": [format!("rendered {} ci workflow", language)],
        }))
    }
}

fn render_workflow(language: &str) -> String {
    let steps = match language {
        "rust" => "      - run: cargo build --all-targets\n      - run: cargo test\n",
        "javascript" => "      - run: npm ci\n      - run: npm test\n",
        "python" => "      - run: pip install -e .\n      - run: pytest\n",
        _ => "      - run: echo \"add build steps here\"\n",
    };

    format!(
        "name: ci\n\non:\n  push:\n  pull_request:\n\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n{}",
        steps
    )
}

fn str_arg(args: &TaskArgs, key: &str) -> Result<String, TaskFailure> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TaskFailure::new(format!("missing string argument '{}'", key)))
}
