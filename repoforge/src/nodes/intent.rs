//! Intent router: classifies the user request and gates on confidence.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use repoforge_sdk::{log_info, log_warning, RunLog};

use crate::collaborators::Clarifier;
use crate::graph::{GraphNode, Transition};
use crate::model::{validate_decision, IntentDecision, ModelService, RetryPolicy};
use crate::nodes;
use crate::state::{WorkflowState, WorkflowStatus};

/// Classification gate: below this confidence the run waits for the user
const CONFIDENCE_GATE: f64 = 0.5;

const SYSTEM_PROMPT: &str = "You classify repository-improvement requests. \
Respond with JSON: {\"intent\": string, \"task_scope\": string, \"confidence\": number}. \
Use intent \"unknown\" when the request is not about improving a repository.";

pub struct IntentRouter {
    model: Arc<dyn ModelService>,
    clarifier: Arc<dyn Clarifier>,
    retry: RetryPolicy,
}

impl IntentRouter {
    pub fn new(
        model: Arc<dyn ModelService>,
        clarifier: Arc<dyn Clarifier>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            clarifier,
            retry,
        }
    }

    fn build_prompt(state: &WorkflowState) -> String {
        let mut prompt = format!(
            "Classify this request against repository {}:\n\n{}\n",
            state.repo_url, state.user_request
        );
        if let Some(attachment) = &state.attachment {
            prompt.push_str(&format!("\nAttached context:\n{}\n", attachment));
        }
        prompt
    }
}

#[async_trait]
impl GraphNode for IntentRouter {
    fn name(&self) -> &str {
        nodes::INTENT_ROUTER
    }

    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        // Re-entry while waiting: absorb the clarification first
        if state.status == WorkflowStatus::WaitingForUser {
            let clarification = self.clarifier.prompt_user().await?;
            if !clarification.user_request.is_empty() {
                if state.user_request.is_empty() {
                    state.user_request = clarification.user_request;
                } else {
                    state.user_request.push('\n');
                    state.user_request.push_str(&clarification.user_request);
                }
            }
            if clarification.attachment.is_some() {
                state.attachment = clarification.attachment;
            }
        }

        let prompt = Self::build_prompt(state);
        let decision = self
            .retry
            .run(|| async {
                let raw = self
                    .model
                    .run_structured_decision(&prompt, SYSTEM_PROMPT)
                    .await?;
                validate_decision::<IntentDecision>(raw)
            })
            .await;

        match decision {
            Ok(decision) if decision.confidence >= CONFIDENCE_GATE && decision.intent != "unknown" => {
                log_info!(
                    "intent '{}' (scope '{}', confidence {:.2})",
                    decision.intent,
                    decision.task_scope,
                    decision.confidence
                );
                state.record_decision(
                    nodes::INTENT_ROUTER,
                    format!(
                        "classified intent '{}' with confidence {:.2}",
                        decision.intent, decision.confidence
                    ),
                );
                state.intent = Some(decision.intent);
                state.task_scope = Some(decision.task_scope);
                state.intent_confidence = Some(decision.confidence);
                state.status = WorkflowStatus::Analyzing;
            }
            Ok(decision) => {
                let reason = format!(
                    "intent '{}' below the confidence gate ({:.2})",
                    decision.intent, decision.confidence
                );
                log_warning!("{}", reason);
                RunLog::ClarificationRequested {
                    reason: reason.clone(),
                }
                .emit();
                state.record_decision(nodes::INTENT_ROUTER, reason);
                state.intent = Some(decision.intent);
                state.intent_confidence = Some(decision.confidence);
                state.status = WorkflowStatus::WaitingForUser;
            }
            Err(err) => {
                // A broken classification is treated like low confidence:
                // wait for more input rather than crash the run
                let reason = format!("intent classification failed: {}", err);
                log_warning!("{}", reason);
                RunLog::ClarificationRequested {
                    reason: reason.clone(),
                }
                .emit();
                state.record_decision(nodes::INTENT_ROUTER, reason);
                state.status = WorkflowStatus::WaitingForUser;
            }
        }

        Ok(())
    }

    fn route(&self, state: &WorkflowState) -> Transition {
        if state.status == WorkflowStatus::WaitingForUser {
            Transition::Next(nodes::INTENT_ROUTER.to_string())
        } else {
            Transition::Next(nodes::REPO_ANALYSIS.to_string())
        }
    }
}
