//! Decision and gating nodes of the workflow graph.
//!
//! Control flow: intent router → (loop until confident) → repo analysis →
//! planner → executor → reviewer → (approved: finalizer; rejected: back to
//! planner, within the re-planning budget).

mod analyze;
mod finalize;
mod intent;
mod planner;
mod review;

pub use analyze::RepoAnalysis;
pub use finalize::Finalizer;
pub use intent::IntentRouter;
pub use planner::Planner;
pub use review::{ApproveAll, ReviewPolicy, Reviewer};

// Node names used for graph wiring and routing
pub const INTENT_ROUTER: &str = "intent_router";
pub const REPO_ANALYSIS: &str = "repo_analysis";
pub const PLANNER: &str = "planner";
pub const EXECUTOR: &str = "executor";
pub const REVIEWER: &str = "reviewer";
pub const FINALIZER: &str = "finalizer";
