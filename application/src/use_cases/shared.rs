//! Shared utilities for use cases.
//!
//! The decode-and-retry step used by both the crew and the direct role
//! operations, plus cancellation helpers.

use crate::ports::agent_executor::{AgentExecutor, ExecutionError};
use litreview_domain::{AgentRole, OutputContract, ParseError, PromptTemplate, TaskOutput, ToolSet};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a stage fell back to its empty default
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("unparsable output: {0}")]
    Parse(#[from] ParseError),

    #[error("cancelled")]
    Cancelled,
}

/// Result of one role-scoped stage after decoding.
///
/// A degraded result carries the contract's empty default and the failure
/// that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub output: TaskOutput,
    /// Executor calls spent, including the corrective retry
    pub attempts: u32,
    pub failure: Option<StageFailure>,
}

impl StageResult {
    fn degraded(contract: &OutputContract, failure: StageFailure, attempts: u32) -> Self {
        Self {
            output: TaskOutput::empty_for(contract),
            attempts,
            failure: Some(failure),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        self.output.as_json()
    }

    pub fn text(&self) -> Option<&str> {
        self.output.as_text()
    }
}

pub(crate) fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(|t| t.is_cancelled())
}

async fn execute_cancellable<E: AgentExecutor + ?Sized>(
    executor: &E,
    role: &AgentRole,
    prompt: &str,
    tools: &ToolSet,
    cancellation_token: &Option<CancellationToken>,
) -> Result<String, StageFailure> {
    match cancellation_token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(StageFailure::Cancelled),
                result = executor.execute(role, prompt, tools) => result.map_err(StageFailure::from),
            }
        }
        None => executor
            .execute(role, prompt, tools)
            .await
            .map_err(StageFailure::from),
    }
}

/// Execute a prompt and decode it against `contract`.
///
/// A contract violation is answered with up to `parse_retries` corrective
/// calls, each carrying the parse error. Execution errors are not retried.
/// Whatever still fails degrades to the contract's empty default.
pub(crate) async fn execute_decoded<E: AgentExecutor + ?Sized>(
    executor: &E,
    role: &AgentRole,
    prompt: &str,
    tools: &ToolSet,
    contract: &OutputContract,
    parse_retries: u32,
    cancellation_token: &Option<CancellationToken>,
) -> StageResult {
    let mut attempts = 0;
    let mut current_prompt = prompt.to_string();

    loop {
        if is_cancelled(cancellation_token) {
            return StageResult::degraded(contract, StageFailure::Cancelled, attempts);
        }

        attempts += 1;
        let raw = match execute_cancellable(executor, role, &current_prompt, tools, cancellation_token)
            .await
        {
            Ok(raw) => raw,
            Err(failure) => {
                warn!("{} execution failed: {}", role.kind, failure);
                return StageResult::degraded(contract, failure, attempts);
            }
        };

        match contract.decode(&raw) {
            Ok(output) => {
                debug!("{} output decoded after {} attempt(s)", role.kind, attempts);
                return StageResult {
                    output,
                    attempts,
                    failure: None,
                };
            }
            Err(e) if attempts <= parse_retries => {
                warn!("{} output rejected ({}), retrying with feedback", role.kind, e);
                current_prompt = PromptTemplate::parse_feedback(prompt, &e, contract);
            }
            Err(e) => {
                warn!(
                    "{} output still unparsable after {} attempt(s): {}",
                    role.kind, attempts, e
                );
                return StageResult::degraded(contract, StageFailure::Parse(e), attempts);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executor shared by the use case tests.

    use super::*;
    use async_trait::async_trait;
    use litreview_domain::RoleKind;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub struct ScriptedExecutor {
        responses: Mutex<VecDeque<Result<String, ExecutionError>>>,
        pub calls: Mutex<Vec<(RoleKind, String)>>,
    }

    impl ScriptedExecutor {
        pub fn new(responses: Vec<Result<String, ExecutionError>>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn replies(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
        }

        pub fn roles(&self) -> Vec<RoleKind> {
            self.calls.lock().unwrap().iter().map(|(r, _)| *r).collect()
        }
    }

    #[async_trait]
    impl AgentExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            role: &AgentRole,
            prompt: &str,
            _tools: &ToolSet,
        ) -> Result<String, ExecutionError> {
            self.calls
                .lock()
                .unwrap()
                .push((role.kind, prompt.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExecutionError::Other("No more responses".to_string())))
        }
    }
}
