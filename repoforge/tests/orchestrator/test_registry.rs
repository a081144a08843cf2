//! Tests for the operation registry against the builtin catalog

use super::common::*;
use repoforge::ops::builtin_registry;
use repoforge::state::WorkflowState;
use repoforge::task::Task;

#[test]
fn test_builtin_catalog_applicability_gates_on_analysis() {
    let registry = builtin_registry().unwrap();

    // Nothing is applicable before the repository has been analyzed
    let bare = WorkflowState::new("repo", "request");
    assert!(registry.applicable(&bare).is_empty());

    // An analyzed repository with no contributing guide unlocks everything
    let analyzed = analyzed_state();
    let names: Vec<&str> = registry
        .applicable(&analyzed)
        .iter()
        .map(|op| op.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["generate_readme", "generate_ci_workflow", "generate_contributing"]
    );
}

#[test]
fn test_duplicate_builtin_registration_is_rejected() {
    let mut registry = builtin_registry().unwrap();
    let err = registry
        .register(repoforge::ops::generate_readme())
        .unwrap_err();
    assert!(err.to_string().contains("generate_readme"));
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_descriptor_lookup_follows_task_provenance() {
    let registry = builtin_registry().unwrap();

    let task = Task::new("readme:render", "generate_readme", "Render README markdown");
    let descriptor = registry.descriptor_for(&task).unwrap();
    assert_eq!(descriptor.method.as_deref(), Some("run"));
    assert!(descriptor.dependencies.contains("doc_generator"));
    assert!(descriptor.state_dependencies.contains("artifacts"));

    let stray = Task::new("ghost:run", "ghost_operation", "From nowhere");
    assert!(registry.descriptor_for(&stray).is_err());
}

#[test]
fn test_plan_expansion_is_repeatable() {
    let registry = builtin_registry().unwrap();
    let op = registry.get("generate_readme").unwrap();

    let first: Vec<String> = op.plan_tasks().iter().map(|t| t.id.clone()).collect();
    let second: Vec<String> = op.plan_tasks().iter().map(|t| t.id.clone()).collect();
    assert_eq!(first, vec!["readme:collect", "readme:render", "readme:write"]);
    assert_eq!(first, second);
}
