//! Port for persisting knowledge stores between runs.

use litreview_domain::{KnowledgeStore, RoleKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Knowledge archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt knowledge archive for {role}: {message}")]
    Corrupt { role: RoleKind, message: String },
}

pub trait KnowledgeArchive: Send + Sync {
    /// Persist every entry of a store, replacing what was saved before.
    fn save(&self, store: &KnowledgeStore) -> Result<(), StoreError>;

    /// Load a role's store; `None` when nothing was saved yet.
    fn load(&self, role: RoleKind) -> Result<Option<KnowledgeStore>, StoreError>;
}
