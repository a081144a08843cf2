// Workflow graph engine
pub mod graph;

// Shared workflow state
pub mod state;

// Task data model
pub mod task;

// Operation data model and registry
pub mod operation;
pub mod registry;

// Execution context and task executor
pub mod context;
pub mod executor;

// Decision and gating nodes
pub mod nodes;

// Model boundary
pub mod model;

// Collaborator interfaces and local implementations
pub mod collaborators;

// Builtin generator tools and operations
pub mod ops;
pub mod tools;

// Error taxonomy
pub mod error;

// CLI and workflow assembly
pub mod cli;
pub mod workflow;
