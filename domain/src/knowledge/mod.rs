//! Per-role knowledge stores.
//!
//! Each role owns one [`KnowledgeStore`]. Entries are keyed by paper id and
//! tagged with the role that wrote them; other roles only ever see store
//! content through task results.
//!
//! Upserts swap a whole `Arc<KnowledgeEntry>` under the write lock, so a
//! concurrent reader observes either the old entry or the new one, never a
//! half-written record.

use crate::agent::role::RoleKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored artifact (paper record, draft, review)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub paper_id: String,
    pub content: serde_json::Value,
    pub writer: RoleKind,
}

/// Key-value archive owned by a single role
#[derive(Debug)]
pub struct KnowledgeStore {
    owner: RoleKind,
    entries: RwLock<BTreeMap<String, Arc<KnowledgeEntry>>>,
}

impl KnowledgeStore {
    pub fn new(owner: RoleKind) -> Self {
        Self {
            owner,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuild a store from previously persisted entries.
    ///
    /// Entries written by another role are dropped.
    pub fn from_entries(owner: RoleKind, entries: Vec<KnowledgeEntry>) -> Self {
        let store = Self::new(owner);
        {
            let mut map = store.write();
            for entry in entries.into_iter().filter(|e| e.writer == owner) {
                map.insert(entry.paper_id.clone(), Arc::new(entry));
            }
        }
        store
    }

    pub fn owner(&self) -> RoleKind {
        self.owner
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<KnowledgeEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<KnowledgeEntry>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace an entry. Returns the entry it replaced, if any.
    pub fn put(
        &self,
        paper_id: impl Into<String>,
        content: serde_json::Value,
    ) -> Option<Arc<KnowledgeEntry>> {
        let paper_id = paper_id.into();
        let entry = Arc::new(KnowledgeEntry {
            paper_id: paper_id.clone(),
            content,
            writer: self.owner,
        });
        self.write().insert(paper_id, entry)
    }

    /// Look up an entry; `None` means the id was never stored.
    pub fn get(&self, paper_id: &str) -> Option<Arc<KnowledgeEntry>> {
        self.read().get(paper_id).cloned()
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.read().contains_key(paper_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of all entries ordered by paper id.
    pub fn entries(&self) -> Vec<Arc<KnowledgeEntry>> {
        self.read().values().cloned().collect()
    }
}

/// The stores of every role for one run
#[derive(Debug, Clone)]
pub struct KnowledgeStores {
    stores: BTreeMap<RoleKind, Arc<KnowledgeStore>>,
}

impl KnowledgeStores {
    pub fn new() -> Self {
        Self {
            stores: RoleKind::ALL
                .iter()
                .map(|k| (*k, Arc::new(KnowledgeStore::new(*k))))
                .collect(),
        }
    }

    /// Replace a role's store, e.g. with one loaded from disk.
    pub fn with_store(mut self, store: KnowledgeStore) -> Self {
        self.stores.insert(store.owner(), Arc::new(store));
        self
    }

    pub fn for_role(&self, kind: RoleKind) -> Arc<KnowledgeStore> {
        match self.stores.get(&kind) {
            Some(store) => Arc::clone(store),
            None => Arc::new(KnowledgeStore::new(kind)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<KnowledgeStore>> {
        self.stores.values()
    }
}

impl Default for KnowledgeStores {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_then_get_roundtrip() {
        let store = KnowledgeStore::new(RoleKind::Phd);
        let content = json!({"title": "Attention Is All You Need", "year": 2017});

        assert!(store.put("1706.03762", content.clone()).is_none());

        let entry = store.get("1706.03762").unwrap();
        assert_eq!(entry.content, content);
        assert_eq!(entry.writer, RoleKind::Phd);
    }

    #[test]
    fn test_get_absent_is_none_not_empty_record() {
        let store = KnowledgeStore::new(RoleKind::Phd);
        store.put("empty", json!({}));

        assert!(store.get("missing").is_none());
        assert_eq!(store.get("empty").unwrap().content, json!({}));
    }

    #[test]
    fn test_reput_overwrites_without_duplicating() {
        let store = KnowledgeStore::new(RoleKind::Phd);
        store.put("p1", json!({"v": 1}));
        let previous = store.put("p1", json!({"v": 2}));

        assert_eq!(previous.unwrap().content, json!({"v": 1}));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("p1").unwrap().content, json!({"v": 2}));
    }

    #[test]
    fn test_reader_keeps_consistent_snapshot() {
        let store = KnowledgeStore::new(RoleKind::Phd);
        store.put("p1", json!({"v": 1}));
        let held = store.get("p1").unwrap();
        store.put("p1", json!({"v": 2}));

        assert_eq!(held.content, json!({"v": 1}));
        assert_eq!(store.get("p1").unwrap().content, json!({"v": 2}));
    }

    #[test]
    fn test_from_entries_drops_foreign_writers() {
        let store = KnowledgeStore::from_entries(
            RoleKind::Phd,
            vec![
                KnowledgeEntry {
                    paper_id: "a".into(),
                    content: json!(1),
                    writer: RoleKind::Phd,
                },
                KnowledgeEntry {
                    paper_id: "b".into(),
                    content: json!(2),
                    writer: RoleKind::Reviewer,
                },
            ],
        );
        assert!(store.contains("a"));
        assert!(!store.contains("b"));
    }

    #[test]
    fn test_stores_are_isolated_per_role() {
        let stores = KnowledgeStores::new();
        stores.for_role(RoleKind::Phd).put("p", json!(1));

        assert_eq!(stores.for_role(RoleKind::Phd).len(), 1);
        assert!(stores.for_role(RoleKind::Reviewer).is_empty());
        assert_eq!(stores.iter().count(), 4);
    }
}
