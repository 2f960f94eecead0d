//! Port for persisting stage documents.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to write artifact '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize artifact '{name}': {message}")]
    Serialize { name: String, message: String },
}

/// Receives the JSON or text document produced by a stage.
///
/// `name` is the stage name without extension (`framework`, `draft`, ...).
/// Writing the same name twice replaces the earlier document.
pub trait ArtifactSink: Send + Sync {
    fn write_json(&self, name: &str, value: &Value) -> Result<(), ArtifactError>;

    fn write_text(&self, name: &str, text: &str) -> Result<(), ArtifactError>;
}

/// Discards every artifact.
pub struct NoArtifacts;

impl ArtifactSink for NoArtifacts {
    fn write_json(&self, _name: &str, _value: &Value) -> Result<(), ArtifactError> {
        Ok(())
    }

    fn write_text(&self, _name: &str, _text: &str) -> Result<(), ArtifactError> {
        Ok(())
    }
}
