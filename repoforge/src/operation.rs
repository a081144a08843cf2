//! Operation data model.
//!
//! An operation is a declarative, named capability: it knows when it applies,
//! how it expands into tasks, and how those tasks are executed. Registry
//! entries are immutable after registration.
//!
//! Execution strategies are resolved into a tagged [`ExecutorKind`] at
//! registration time - function-style (one callable) or class-style
//! (construct an instance from the merged arguments, then invoke the
//! descriptor's method on it) - so the executor's hot path never inspects
//! shapes at runtime.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ToolSet;
use crate::error::TaskFailure;
use crate::state::WorkflowState;
use crate::task::{Task, TaskArgs};

/// Function-style executor: a single async callable
#[async_trait]
pub trait TaskFn: Send + Sync {
    async fn call(&self, tools: &ToolSet, args: TaskArgs) -> Result<Value, TaskFailure>;
}

/// Class-style executor: builds an instance from the merged arguments
pub trait TaskFactory: Send + Sync {
    fn construct(&self, tools: &ToolSet, args: TaskArgs) -> Result<Box<dyn TaskInstance>, TaskFailure>;
}

/// An instance produced by a [`TaskFactory`], driven via a named method
#[async_trait]
pub trait TaskInstance: Send + Sync {
    async fn invoke(&self, method: &str) -> Result<Value, TaskFailure>;
}

impl fmt::Debug for dyn TaskInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn TaskInstance")
    }
}

/// Execution strategy, tagged at registration time
#[derive(Clone)]
pub enum ExecutorKind {
    Function(Arc<dyn TaskFn>),
    Class(Arc<dyn TaskFactory>),
}

impl fmt::Debug for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::Function(_) => write!(f, "ExecutorKind::Function"),
            ExecutorKind::Class(_) => write!(f, "ExecutorKind::Class"),
        }
    }
}

/// How the executor invokes an operation's tasks
#[derive(Clone, Debug)]
pub struct ExecutionDescriptor {
    pub kind: ExecutorKind,

    /// Method to invoke on a class-style instance. Must be set for
    /// class-style executors and unset for function-style ones.
    pub method: Option<String>,

    /// Execution-context entries to inject, by name
    pub dependencies: BTreeSet<String>,

    /// Workflow-state attributes to merge into the arguments, by name
    pub state_dependencies: BTreeSet<String>,
}

/// Static blueprint for one task an operation expands into
#[derive(Clone, Debug)]
pub struct TaskSpec {
    pub id: String,
    pub description: String,
    pub args: TaskArgs,
}

type ApplicablePredicate = Arc<dyn Fn(&WorkflowState) -> bool + Send + Sync>;

/// A registered capability
#[derive(Clone)]
pub struct Operation {
    pub name: String,
    pub description: String,
    /// Lower runs first; ties keep registration order
    pub priority: i32,
    pub descriptor: ExecutionDescriptor,
    applicable: ApplicablePredicate,
    tasks: Vec<TaskSpec>,
}

impl Operation {
    pub fn builder(name: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(name)
    }

    pub fn is_applicable(&self, state: &WorkflowState) -> bool {
        (self.applicable)(state)
    }

    /// Expand into fresh task instances. Pure and deterministic: driven only
    /// by the operation's static task specs, never by live state.
    pub fn plan_tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|spec| {
                Task::new(&spec.id, &self.name, &spec.description).with_args(spec.args.clone())
            })
            .collect()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Builder for [`Operation`]
pub struct OperationBuilder {
    name: String,
    description: String,
    priority: i32,
    kind: Option<ExecutorKind>,
    method: Option<String>,
    dependencies: BTreeSet<String>,
    state_dependencies: BTreeSet<String>,
    applicable: ApplicablePredicate,
    tasks: Vec<TaskSpec>,
}

impl OperationBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            priority: 0,
            kind: None,
            method: None,
            dependencies: BTreeSet::new(),
            state_dependencies: BTreeSet::new(),
            applicable: Arc::new(|_| true),
            tasks: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Applicability predicate consulted by the registry
    pub fn applicable_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&WorkflowState) -> bool + Send + Sync + 'static,
    {
        self.applicable = Arc::new(predicate);
        self
    }

    pub fn function(mut self, executor: Arc<dyn TaskFn>) -> Self {
        self.kind = Some(ExecutorKind::Function(executor));
        self
    }

    pub fn class(mut self, factory: Arc<dyn TaskFactory>, method: impl Into<String>) -> Self {
        self.kind = Some(ExecutorKind::Class(factory));
        self.method = Some(method.into());
        self
    }

    /// Name an execution-context entry to inject at dispatch
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Name a workflow-state attribute to merge into the arguments
    pub fn reads_state(mut self, name: impl Into<String>) -> Self {
        self.state_dependencies.insert(name.into());
        self
    }

    /// Add a task blueprint to the static expansion
    pub fn task(mut self, id: impl Into<String>, description: impl Into<String>, args: TaskArgs) -> Self {
        self.tasks.push(TaskSpec {
            id: id.into(),
            description: description.into(),
            args,
        });
        self
    }

    pub fn build(self) -> Operation {
        let kind = self
            .kind
            .unwrap_or_else(|| ExecutorKind::Function(Arc::new(NoopFn)));
        Operation {
            name: self.name,
            description: self.description,
            priority: self.priority,
            descriptor: ExecutionDescriptor {
                kind,
                method: self.method,
                dependencies: self.dependencies,
                state_dependencies: self.state_dependencies,
            },
            applicable: self.applicable,
            tasks: self.tasks,
        }
    }
}

/// Default executor for operations built without one; returns no output
struct NoopFn;

#[async_trait]
impl TaskFn for NoopFn {
    async fn call(&self, _tools: &ToolSet, _args: TaskArgs) -> Result<Value, TaskFailure> {
        Ok(Value::Null)
    }
}
