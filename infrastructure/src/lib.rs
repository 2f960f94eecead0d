//! Infrastructure layer for litreview
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod journal;
pub mod model;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileKnowledgeConfig, FileLoggingConfig,
    FileModelConfig, FileOutputConfig, FilePipelineConfig, FileSearchConfig,
};
pub use journal::JsonlRunJournal;
pub use model::{ModelEndpoint, OpenAiCompatibleExecutor};
pub use search::ArxivSearch;
pub use storage::{FileArtifactWriter, JsonKnowledgeArchive};
