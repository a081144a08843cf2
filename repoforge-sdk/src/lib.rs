//! Shared logging vocabulary for repoforge workflows.
//!
//! Workflows emit two kinds of output:
//!
//! 1. **Structured events** ([`RunLog`]) - JSON lines on stderr with the
//!    `__RF_EVENT__:` prefix, for machine consumers (supervisors, UIs).
//! 2. **Console output** - colored human-readable lines on stdout, produced
//!    by the `log_*!` macros in this crate.

use serde::{Deserialize, Serialize};

/// Structured events emitted by a workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLog {
    /// A graph node started executing
    NodeStarted { node: String },
    /// A graph node finished and routed onward
    NodeCompleted { node: String, next: Option<String> },
    /// The planner produced a plan
    PlanCreated {
        operations: Vec<String>,
        task_count: usize,
        reasoning: String,
    },
    /// Task started
    TaskStarted {
        task_id: String,
        description: String,
        position: usize,
        total: usize,
    },
    /// Task completed
    TaskCompleted {
        task_id: String,
        events: Vec<String>,
    },
    /// Task failed (the run continues)
    TaskFailed { task_id: String, error: String },
    /// Intent classification needs more input from the user
    ClarificationRequested { reason: String },
    /// Reviewer verdict for the current plan's artifacts
    ReviewOutcome { approved: bool, replan_cycle: usize },
    /// The run reached a terminal state
    RunFinished { status: String },
}

impl RunLog {
    /// Emit this event to stderr for machine parsing
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__RF_EVENT__:{}", json);
            // Force flush stderr in async contexts
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse an event back out of a stderr line, if it carries one
    pub fn parse_line(line: &str) -> Option<RunLog> {
        let json = line.strip_prefix("__RF_EVENT__:")?;
        serde_json::from_str(json).ok()
    }
}

/// Logs a graph node entering execution.
///
/// # Example
/// ```
/// use repoforge_sdk::log_node_start;
/// log_node_start!("planner");
/// ```
#[macro_export]
macro_rules! log_node_start {
    ($node:expr) => {
        println!("\x1b[1;36m═══ NODE: {} ═══\x1b[0m", $node);
        $crate::RunLog::NodeStarted {
            node: $node.to_string(),
        }
        .emit();
    };
}

/// Logs a graph node completing, with its routing decision.
#[macro_export]
macro_rules! log_node_complete {
    ($node:expr) => {
        println!("\x1b[32m✓ {} complete\x1b[0m", $node);
        $crate::RunLog::NodeCompleted {
            node: $node.to_string(),
            next: None,
        }
        .emit();
    };
    ($node:expr, $next:expr) => {
        println!("\x1b[32m✓ {} → {}\x1b[0m", $node, $next);
        $crate::RunLog::NodeCompleted {
            node: $node.to_string(),
            next: Some($next.to_string()),
        }
        .emit();
    };
}

/// Logs the start of a task within the execution phase.
#[macro_export]
macro_rules! log_task_start {
    ($task_id:expr, $desc:expr, $pos:expr, $total:expr) => {
        println!(
            "\x1b[36m→ [{}/{}] {}: {}\x1b[0m",
            $pos, $total, $task_id, $desc
        );
        $crate::RunLog::TaskStarted {
            task_id: $task_id.to_string(),
            description: $desc.to_string(),
            position: $pos,
            total: $total,
        }
        .emit();
    };
}

/// Logs a completed task.
#[macro_export]
macro_rules! log_task_complete {
    ($task_id:expr) => {
        println!("\x1b[32m✓ Task {} complete\x1b[0m", $task_id);
        $crate::RunLog::TaskCompleted {
            task_id: $task_id.to_string(),
            events: Vec::new(),
        }
        .emit();
    };
    ($task_id:expr, $events:expr) => {
        println!("\x1b[32m✓ Task {} complete\x1b[0m", $task_id);
        $crate::RunLog::TaskCompleted {
            task_id: $task_id.to_string(),
            events: $events,
        }
        .emit();
    };
}

/// Logs a failed task. Task failure is additive information, not a crash.
#[macro_export]
macro_rules! log_task_failed {
    ($task_id:expr, $error:expr) => {
        println!("\x1b[31m✗ Task {} failed: {}\x1b[0m", $task_id, $error);
        $crate::RunLog::TaskFailed {
            task_id: $task_id.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

/// Logs an informational message.
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}
