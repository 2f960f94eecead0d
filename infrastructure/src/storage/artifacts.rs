//! Stage documents on disk.

use super::write_atomic;
use litreview_application::ports::artifact_sink::{ArtifactError, ArtifactSink};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `<dir>/<name>.json` (pretty-printed) and `<dir>/<name>.txt`.
#[derive(Debug, Clone)]
pub struct FileArtifactWriter {
    dir: PathBuf,
}

impl FileArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, name: &str, extension: &str, contents: &[u8]) -> Result<(), ArtifactError> {
        let path = self.dir.join(format!("{}.{}", name, extension));
        write_atomic(&path, contents).map_err(|source| ArtifactError::Io {
            name: name.to_string(),
            source,
        })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl ArtifactSink for FileArtifactWriter {
    fn write_json(&self, name: &str, value: &Value) -> Result<(), ArtifactError> {
        let body = serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Serialize {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        self.write(name, "json", &body)
    }

    fn write_text(&self, name: &str, text: &str) -> Result<(), ArtifactError> {
        self.write(name, "txt", text.as_bytes())
    }
}
