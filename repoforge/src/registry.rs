//! Operation registry: the static catalog of capabilities.
//!
//! Registration order is preserved and used as the tie-break when priorities
//! collide, which keeps planning deterministic across runs.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::operation::{ExecutionDescriptor, Operation};
use crate::state::WorkflowState;
use crate::task::Task;

#[derive(Default)]
pub struct OperationRegistry {
    ops: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation. Names are unique; a duplicate is a wiring bug.
    pub fn register(&mut self, op: Operation) -> Result<(), ConfigError> {
        if self.index.contains_key(&op.name) {
            return Err(ConfigError::DuplicateOperation {
                name: op.name.clone(),
            });
        }
        self.index.insert(op.name.clone(), self.ops.len());
        self.ops.push(op);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.index.get(name).map(|&i| &self.ops[i])
    }

    /// Operations applicable to the given state, in stable registration order
    pub fn applicable(&self, state: &WorkflowState) -> Vec<&Operation> {
        self.ops.iter().filter(|op| op.is_applicable(state)).collect()
    }

    /// Map a concrete task back to the descriptor of the operation that
    /// produced it. An unknown provenance means the executor and registry
    /// disagree about the plan - fail loudly.
    pub fn descriptor_for(&self, task: &Task) -> Result<&ExecutionDescriptor, ConfigError> {
        self.get(&task.operation)
            .map(|op| &op.descriptor)
            .ok_or_else(|| ConfigError::UnknownTaskProvenance {
                task_id: task.id.clone(),
                operation: task.operation.clone(),
            })
    }

    /// All registered operations, in registration order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
