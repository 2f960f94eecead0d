//! Output, knowledge and logging configuration from TOML
//! (`[output]`, `[knowledge]` and `[logging]` sections)

use litreview_domain::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Directory receiving stage artifacts and the report
    pub dir: PathBuf,
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: None,
            color: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    /// One JSON file per role is kept here
    pub dir: PathBuf,
    /// Load stores before a run and save them after
    pub persist: bool,
}

impl Default for FileKnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("knowledge_base"),
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write a daily log file and the run journal here when set
    pub dir: Option<PathBuf>,
}
