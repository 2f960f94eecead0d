//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Only construction-time misconfiguration and top-level input validation
/// surface as `DomainError`. Task-local failures are absorbed by the crew
/// and recorded as task status instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Task '{0}' has an empty description")]
    EmptyDescription(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Task '{task}' references unknown context task '{missing}'")]
    UnknownContext { task: String, missing: String },

    #[error("Task '{task}' references '{target}' which is declared later")]
    ForwardReference { task: String, target: String },

    #[error("Context cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Invalid revision transition from {from} via {action}")]
    InvalidTransition { from: String, action: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Check if this error is a pipeline construction error
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyDescription(_)
                | DomainError::DuplicateTask(_)
                | DomainError::UnknownContext { .. }
                | DomainError::ForwardReference { .. }
                | DomainError::Cycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_cycle_display_joins_path() {
        let error = DomainError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(error.to_string(), "Context cycle detected: a -> b -> a");
    }

    #[test]
    fn test_construction_error_classification() {
        assert!(DomainError::Cycle { path: vec![] }.is_construction_error());
        assert!(DomainError::DuplicateTask("x".into()).is_construction_error());
        assert!(!DomainError::InputValidation("topic".into()).is_construction_error());
        assert!(!DomainError::Cancelled.is_construction_error());
    }
}
