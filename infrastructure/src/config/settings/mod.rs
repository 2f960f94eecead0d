//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod model;
mod output;
mod pipeline;
mod search;

pub use model::FileModelConfig;
pub use output::{FileKnowledgeConfig, FileLoggingConfig, FileOutputConfig};
pub use pipeline::FilePipelineConfig;
pub use search::FileSearchConfig;

use litreview_application::PipelineParams;
use litreview_domain::RevisionPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("model.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("model.model cannot be empty")]
    EmptyModelName,

    #[error("model.base_url must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("model.temperature must be between 0.0 and 2.0 (got {0})")]
    InvalidTemperature(f32),

    #[error("search.max_results cannot be 0")]
    InvalidSearchMaxResults,

    #[error("pipeline.max_revision_cycles cannot be 0")]
    InvalidRevisionCycles,

    #[error("pipeline.papers_per_keyword cannot be 0")]
    InvalidPapersPerKeyword,

    #[error("pipeline.on_exhaustion: {0}")]
    InvalidExhaustionPolicy(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: FileModelConfig,
    pub search: FileSearchConfig,
    pub pipeline: FilePipelineConfig,
    pub output: FileOutputConfig,
    pub knowledge: FileKnowledgeConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.model.timeout_seconds == 0 {
            errors.push(ConfigValidationError::InvalidTimeout);
        }
        if self.model.model.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyModelName);
        }
        let base_url = self.model.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ConfigValidationError::InvalidBaseUrl(base_url.to_string()));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            errors.push(ConfigValidationError::InvalidTemperature(
                self.model.temperature,
            ));
        }
        if self.search.max_results == 0 {
            errors.push(ConfigValidationError::InvalidSearchMaxResults);
        }
        if self.pipeline.max_revision_cycles == 0 {
            errors.push(ConfigValidationError::InvalidRevisionCycles);
        }
        if self.pipeline.papers_per_keyword == 0 {
            errors.push(ConfigValidationError::InvalidPapersPerKeyword);
        }
        if let Err(e) = self.pipeline.parse_exhaustion() {
            errors.push(ConfigValidationError::InvalidExhaustionPolicy(e));
        }

        errors
    }

    /// Application-level parameters. Invalid values fall back to defaults;
    /// call [`validate`](Self::validate) first to report them.
    pub fn to_pipeline_params(&self) -> PipelineParams {
        let revision = RevisionPolicy::new(self.pipeline.max_revision_cycles)
            .with_exhaustion(self.pipeline.parse_exhaustion().unwrap_or_default());

        PipelineParams::default()
            .with_search_max_results(self.search.max_results.max(1))
            .with_papers_per_keyword(self.pipeline.papers_per_keyword.max(1))
            .with_parse_retries(self.pipeline.parse_retries)
            .with_filters(self.search.filters())
            .with_revision(revision)
            .with_skip_revision(self.pipeline.skip_revision)
            .with_persist_knowledge(self.knowledge.persist)
    }
}
