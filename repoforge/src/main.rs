use anyhow::Result;
use clap::Parser;
use serde_json::json;

use repoforge::cli::Args;
use repoforge::ops::builtin_registry;
use repoforge::state::WorkflowStatus;
use repoforge::workflow::{run_repoforge_workflow, WorkflowConfig};

/// Print the builtin operation catalog as JSON, for external integrations
fn print_catalog() -> Result<()> {
    let registry = builtin_registry()?;
    let ops: Vec<_> = registry
        .operations()
        .map(|op| {
            json!({
                "name": op.name,
                "description": op.description,
                "priority": op.priority,
                "tasks": op.plan_tasks().iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({"operations": ops}))?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.catalog {
        return print_catalog();
    }
    args.validate()?;

    let config = WorkflowConfig::from(args);
    let state = run_repoforge_workflow(config).await?;

    println!();
    println!("Session {} finished with status {:?}", state.session_id, state.status);
    println!(
        "Tasks: {} planned, {} artifact(s) produced",
        state.plan.len(),
        state.artifacts.len()
    );
    for record in &state.session_memory {
        println!("  [{}] {}", record.node, record.summary);
    }

    if state.status != WorkflowStatus::Completed {
        std::process::exit(1);
    }
    Ok(())
}
