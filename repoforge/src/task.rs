//! Task data model.
//!
//! A task is one concrete, independently-statused unit of executable work,
//! produced by expanding an operation. Tasks are created by the planner,
//! mutated only by the executor, and never deleted - a re-planning pass
//! replaces the whole plan with fresh instances.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named arguments for a task invocation
pub type TaskArgs = serde_json::Map<String, Value>;

/// Task lifecycle status. Transitions are monotonic:
/// `Pending → InProgress → {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// One unit of work in a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable id, unique within a plan
    pub id: String,

    /// Name of the registry operation that produced this task
    pub operation: String,

    /// Human-readable description
    pub description: String,

    /// Explicit arguments; highest precedence in the executor's merge
    #[serde(default)]
    pub args: TaskArgs,

    pub status: TaskStatus,

    /// Structured result, set on completion or failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Events emitted while executing
    #[serde(default)]
    pub events: Vec<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        operation: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            description: description.into(),
            args: TaskArgs::new(),
            status: TaskStatus::Pending,
            result: None,
            events: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: TaskArgs) -> Self {
        self.args = args;
        self
    }
}

/// Normalized output of a task execution: the artifact shape stored under
/// the task's id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default)]
    pub events: Vec<String>,
}

impl TaskOutput {
    /// Normalize a raw executor return value:
    ///
    /// - `null` becomes an empty output;
    /// - an object is read for its optional `result` / `events` keys;
    /// - anything else becomes the `result` with no events.
    pub fn normalize(raw: Value) -> Self {
        match raw {
            Value::Null => Self::default(),
            Value::Object(map) => {
                let result = map.get("result").cloned().filter(|v| !v.is_null());
                let events = map
                    .get("events")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Self { result, events }
            }
            other => Self {
                result: Some(other),
                events: Vec::new(),
            },
        }
    }
}
