//! Expected-output contracts and decoding of raw model output.
//!
//! A contract states what a task must produce. Decoding is the single
//! place where free-form model text becomes a [`TaskOutput`]; a decode
//! failure is a [`ParseError`], which the crew answers with one
//! corrective retry before falling back to [`TaskOutput::empty_for`].

use crate::core::string::extract_json_block;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why raw output did not satisfy a contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("output is empty")]
    Empty,

    #[error("no JSON document found in output")]
    NoJson,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// What a task promises to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContract {
    /// Free text (drafting-style tasks)
    #[default]
    Text,
    /// A JSON object carrying at least the listed top-level keys
    Json { required_keys: Vec<String> },
}

impl OutputContract {
    pub fn json(keys: &[&str]) -> Self {
        OutputContract::Json {
            required_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, OutputContract::Json { .. })
    }

    /// One-line description appended to prompts.
    pub fn describe(&self) -> String {
        match self {
            OutputContract::Text => "Respond with plain text.".to_string(),
            OutputContract::Json { required_keys } if required_keys.is_empty() => {
                "Respond with a single JSON object.".to_string()
            }
            OutputContract::Json { required_keys } => format!(
                "Respond with a single JSON object containing the keys: {}.",
                required_keys.join(", ")
            ),
        }
    }

    /// Decode raw model output against this contract.
    pub fn decode(&self, raw: &str) -> Result<TaskOutput, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        match self {
            OutputContract::Text => Ok(TaskOutput::Text(raw.trim().to_string())),
            OutputContract::Json { required_keys } => {
                let candidate = extract_json_block(raw).unwrap_or(raw.trim());
                let value: serde_json::Value = serde_json::from_str(candidate).map_err(|e| {
                    if extract_json_block(raw).is_none() {
                        ParseError::NoJson
                    } else {
                        ParseError::InvalidJson(e.to_string())
                    }
                })?;

                let object = value.as_object().ok_or(ParseError::NotAnObject)?;
                let missing: Vec<String> = required_keys
                    .iter()
                    .filter(|k| !object.contains_key(k.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    return Err(ParseError::MissingKeys(missing));
                }

                Ok(TaskOutput::Json(value))
            }
        }
    }
}

/// A decoded task result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TaskOutput {
    Text(String),
    Json(serde_json::Value),
}

impl TaskOutput {
    /// The fallback result for a contract: empty text or an empty object.
    pub fn empty_for(contract: &OutputContract) -> Self {
        match contract {
            OutputContract::Text => TaskOutput::Text(String::new()),
            OutputContract::Json { .. } => {
                TaskOutput::Json(serde_json::Value::Object(serde_json::Map::new()))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TaskOutput::Text(text) => text.trim().is_empty(),
            TaskOutput::Json(serde_json::Value::Object(map)) => map.is_empty(),
            TaskOutput::Json(serde_json::Value::Null) => true,
            TaskOutput::Json(_) => false,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            TaskOutput::Json(value) => Some(value),
            TaskOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TaskOutput::Text(text) => Some(text),
            TaskOutput::Json(_) => None,
        }
    }

    /// JSON form for storage; text becomes `{"text": ...}`.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            TaskOutput::Json(value) => value.clone(),
            TaskOutput::Text(text) => serde_json::json!({ "text": text }),
        }
    }

    /// Render for inclusion in a downstream prompt.
    pub fn render(&self) -> String {
        match self {
            TaskOutput::Text(text) => text.clone(),
            TaskOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}
