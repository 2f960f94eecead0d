//! Agent executor port
//!
//! Defines the interface for handing a role-scoped prompt to a language model.

use async_trait::async_trait;
use litreview_domain::{AgentRole, ToolSet};
use thiserror::Error;

/// Errors that can occur while executing a prompt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Executes prompts on behalf of a role
///
/// This port defines how the application layer reaches a language model.
/// Implementations (adapters) live in the infrastructure layer. The
/// returned string is raw model output; decoding it against a contract is
/// the caller's job.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        role: &AgentRole,
        prompt: &str,
        tools: &ToolSet,
    ) -> Result<String, ExecutionError>;
}
