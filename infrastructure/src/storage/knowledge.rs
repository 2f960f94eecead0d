//! Knowledge stores persisted as one JSON file per role.

use super::write_atomic;
use litreview_application::ports::knowledge_archive::{KnowledgeArchive, StoreError};
use litreview_domain::{KnowledgeEntry, KnowledgeStore, RoleKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct ArchiveFile {
    role: RoleKind,
    entries: Vec<KnowledgeEntry>,
}

/// Keeps `<dir>/<role>_knowledge.json` for each role.
#[derive(Debug, Clone)]
pub struct JsonKnowledgeArchive {
    dir: PathBuf,
}

impl JsonKnowledgeArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, role: RoleKind) -> PathBuf {
        self.dir.join(format!("{}_knowledge.json", role.as_str()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KnowledgeArchive for JsonKnowledgeArchive {
    fn save(&self, store: &KnowledgeStore) -> Result<(), StoreError> {
        let role = store.owner();
        let file = ArchiveFile {
            role,
            entries: store.entries().iter().map(|e| e.as_ref().clone()).collect(),
        };
        let body = serde_json::to_vec_pretty(&file).map_err(|e| StoreError::Corrupt {
            role,
            message: e.to_string(),
        })?;

        let path = self.path_for(role);
        write_atomic(&path, &body)?;
        debug!("Saved {} entries to {}", file.entries.len(), path.display());
        Ok(())
    }

    fn load(&self, role: RoleKind) -> Result<Option<KnowledgeStore>, StoreError> {
        let path = self.path_for(role);
        let body = match std::fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: ArchiveFile = serde_json::from_slice(&body).map_err(|e| StoreError::Corrupt {
            role,
            message: e.to_string(),
        })?;
        if file.role != role {
            return Err(StoreError::Corrupt {
                role,
                message: format!("file belongs to {}", file.role),
            });
        }

        Ok(Some(KnowledgeStore::from_entries(role, file.entries)))
    }
}
