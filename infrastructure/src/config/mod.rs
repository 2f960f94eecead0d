//! Configuration file loading for litreview
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `LITREVIEW_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./litreview.toml` or `./.litreview.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/litreview/config.toml`
//! 5. Default values

mod loader;
mod settings;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use settings::{
    ConfigValidationError, FileConfig, FileKnowledgeConfig, FileLoggingConfig, FileModelConfig,
    FileOutputConfig, FilePipelineConfig, FileSearchConfig,
};
