//! Topic value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A research topic to be reviewed (Value Object)
///
/// The entry point of every review run. Construction rejects empty or
/// whitespace-only input so nothing downstream ever sees a blank topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    content: String,
}

impl Topic {
    /// Create a topic, rejecting blank input with [`DomainError::InputValidation`]
    pub fn parse(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InputValidation(
                "research topic cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content: content.trim().to_string(),
        })
    }

    /// Get the topic text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Lowercase slug of the topic: alphanumeric runs joined by `-`.
    ///
    /// Keys a review's entries in the knowledge stores, so reruns of the
    /// same topic overwrite rather than accumulate.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.content.len());
        for c in self.content.chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let trimmed = slug.trim_end_matches('-');
        if trimmed.is_empty() {
            "untitled".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Reject blank input for a named field.
///
/// Shared by every role operation that takes free text.
pub fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::InputValidation(format!("{} cannot be empty", field)))
    } else {
        Ok(())
    }
}

/// Reject null, empty-object, empty-array and blank-string JSON values.
pub fn require_value(field: &str, value: &serde_json::Value) -> Result<(), DomainError> {
    let empty = match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    if empty {
        Err(DomainError::InputValidation(format!("{} cannot be empty", field)))
    } else {
        Ok(())
    }
}
