//! Execution context: the read-only bag of named dependencies available to
//! task executors.
//!
//! An entry is either a plain JSON value (merged into task arguments at the
//! lowest precedence) or a collaborator tool handle (injected into the
//! executor by name). The context is assembled once at wiring time and never
//! mutated during a run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskFailure;
use crate::task::TaskArgs;

/// A named collaborator handle that task executors can invoke, e.g. a
/// documentation generator or a workflow-file generator.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn call(&self, args: &TaskArgs) -> Result<Value, TaskFailure>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Tool")
    }
}

/// One named dependency in the execution context
#[derive(Clone)]
pub enum ContextEntry {
    /// Plain value, merged into task arguments below state values and
    /// explicit task args
    Value(Value),
    /// Collaborator handle, passed to the executor out of band
    Tool(Arc<dyn Tool>),
}

/// Immutable bag of named dependencies
#[derive(Clone, Default)]
pub struct ExecutionContext {
    entries: HashMap<String, ContextEntry>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries.insert(name.into(), ContextEntry::Value(value));
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        self.entries.insert(name.into(), ContextEntry::Tool(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContextEntry> {
        self.entries.get(name)
    }
}

/// The subset of tool handles resolved for one task dispatch, keyed by the
/// dependency names in the operation's execution descriptor.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn insert(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) {
        self.tools.insert(name.into(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Fetch a tool that the descriptor promised to inject
    pub fn require(&self, name: &str) -> Result<Arc<dyn Tool>, TaskFailure> {
        self.get(name)
            .ok_or_else(|| TaskFailure::new(format!("tool '{}' was not injected", name)))
    }
}
