//! Boundary to the language-model backend.
//!
//! The core never trusts model output: every decision is deserialized into a
//! closed serde schema, and a parse failure is a retryable [`ModelError`],
//! never a crash. [`ScriptedModelService`] replays canned decisions from a
//! YAML file, which makes runs reproducible and doubles as the test double.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model backend error: {0}")]
    Backend(String),

    #[error("model output failed schema validation: {0}")]
    Schema(String),
}

/// Intent classification decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDecision {
    pub intent: String,
    #[serde(default)]
    pub task_scope: String,
    pub confidence: f64,
}

/// Plan selection decision: a subset of operation names plus a rationale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDecision {
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// Narrow interface to the model backend
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Run one structured decision and return the raw JSON. Callers validate
    /// it against their own closed schema via [`validate_decision`].
    async fn run_structured_decision(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<Value, ModelError>;
}

/// Validate raw model output against a closed schema type
pub fn validate_decision<T: DeserializeOwned>(raw: Value) -> Result<T, ModelError> {
    serde_json::from_value(raw).map_err(|e| ModelError::Schema(e.to_string()))
}

/// Retry policy for model calls: fixed attempt budget, exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the next attempt: `base * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Run an operation up to `max_retries` times, sleeping between attempts
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ModelError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ModelError>>,
    {
        let mut last = ModelError::Backend("no attempts were made".to_string());
        for attempt in 0..self.max_retries.max(1) {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last = err;
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
            }
        }
        Err(last)
    }
}

/// Model service that replays a scripted queue of decisions.
///
/// The script is an ordered YAML sequence of JSON-compatible values; each
/// structured-decision call pops the next one. An exhausted script is a
/// backend error, which the callers' retry/degrade paths absorb.
pub struct ScriptedModelService {
    decisions: Mutex<VecDeque<Value>>,
}

impl ScriptedModelService {
    pub fn new(decisions: Vec<Value>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
        }
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read decision script {}", path.display()))?;
        let decisions: Vec<Value> = serde_yaml::from_str(&text)
            .with_context(|| format!("Decision script {} is not a YAML sequence", path.display()))?;
        Ok(Self::new(decisions))
    }

    pub fn remaining(&self) -> usize {
        self.decisions.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ModelService for ScriptedModelService {
    async fn run_structured_decision(
        &self,
        _prompt: &str,
        _system_prompt: &str,
    ) -> Result<Value, ModelError> {
        let mut queue = self
            .decisions
            .lock()
            .map_err(|_| ModelError::Backend("decision script lock poisoned".to_string()))?;
        queue
            .pop_front()
            .ok_or_else(|| ModelError::Backend("decision script exhausted".to_string()))
    }
}
