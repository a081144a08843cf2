//! End-to-end workflow tests against a real local repository

use std::path::PathBuf;
use std::time::Duration;

use super::common::*;
use repoforge::model::RetryPolicy;
use repoforge::state::WorkflowStatus;
use repoforge::task::TaskStatus;
use repoforge::workflow::{run_repoforge_workflow, WorkflowConfig};

/// Minimal Rust repository with no README, no CI, and no contributing guide
fn seed_repo(dir: &PathBuf) {
    std::fs::write(
        dir.join("Cargo.toml"),
        "[package]\nname = \"sample\"\nversion = \"0.1.0\"\n\n[dependencies]\nserde = \"1\"\n",
    )
    .unwrap();
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::write(dir.join("src").join("lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
    std::fs::create_dir_all(dir.join("tests")).unwrap();
}

fn write_decisions(dir: &PathBuf) -> PathBuf {
    let path = dir.join("decisions.yaml");
    std::fs::write(
        &path,
        concat!(
            "- intent: new_task\n",
            "  task_scope: docs\n",
            "  confidence: 0.9\n",
            "- operations:\n",
            "    - generate_readme\n",
            "    - generate_ci_workflow\n",
            "    - generate_contributing\n",
            "  reasoning: the repository is missing all three\n",
        ),
    )
    .unwrap();
    path
}

#[tokio::test]
async fn test_full_run_improves_the_repository() {
    let dir = create_temp_dir("full_run");
    let repo = dir.join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    seed_repo(&repo);
    let decisions = write_decisions(&dir);
    let report = dir.join("report.yaml");

    let config = WorkflowConfig {
        repo_path: repo.clone(),
        repo_url: "https://example.com/sample.git".to_string(),
        request: "add a readme, ci, and a contributing guide".to_string(),
        decisions_path: decisions,
        output_dir: repo.clone(),
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
        max_replan_cycles: 3,
        report_path: Some(report.clone()),
        debug: false,
    };

    let state = run_repoforge_workflow(config).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.approval, Some(true));

    // Priority order: ci (0), then readme (10), then contributing (20)
    let ids: Vec<&str> = state.plan.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "ci:render",
            "ci:write",
            "readme:collect",
            "readme:render",
            "readme:write",
            "contributing:write",
        ]
    );
    assert!(state.plan.iter().all(|t| t.status == TaskStatus::Completed));
    assert_eq!(state.artifacts.len(), 6);

    // The generated files landed in the repository
    let readme = std::fs::read_to_string(repo.join("README.md")).unwrap();
    assert!(readme.starts_with("# sample"));
    assert!(readme.contains("- serde"));
    let ci = std::fs::read_to_string(
        repo.join(".github").join("workflows").join("ci.yml"),
    )
    .unwrap();
    assert!(ci.contains("cargo test"));
    assert!(repo.join("CONTRIBUTING.md").is_file());

    // The run report round-trips through YAML
    let report_text = std::fs::read_to_string(&report).unwrap();
    let reloaded: repoforge::state::WorkflowState =
        serde_yaml::from_str(&report_text).unwrap();
    assert_eq!(reloaded.session_id, state.session_id);
    assert_eq!(reloaded.plan.len(), 6);

    cleanup_temp_dir(&dir);
}

#[tokio::test]
async fn test_run_with_unplannable_model_completes_empty() {
    // The intent decision clears the gate, but planning decisions are
    // exhausted: the run degrades to an empty plan and still completes
    let dir = create_temp_dir("empty_plan_run");
    let repo = dir.join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    seed_repo(&repo);

    let decisions = dir.join("decisions.yaml");
    std::fs::write(
        &decisions,
        "- intent: new_task\n  task_scope: docs\n  confidence: 0.9\n",
    )
    .unwrap();

    let config = WorkflowConfig {
        repo_path: repo.clone(),
        repo_url: repo.to_string_lossy().to_string(),
        request: "improve things".to_string(),
        decisions_path: decisions,
        output_dir: repo.clone(),
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
        max_replan_cycles: 3,
        report_path: None,
        debug: false,
    };

    let state = run_repoforge_workflow(config).await.unwrap();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert!(state.plan.is_empty());
    assert!(state.artifacts.is_empty());
    assert!(!repo.join("README.md").exists());

    cleanup_temp_dir(&dir);
}
