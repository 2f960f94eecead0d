//! Pipeline parameters: use case control.
//!
//! [`PipelineParams`] groups the static parameters that control the crew,
//! the retrieval stage and the revision loop. These are application-layer
//! concerns, not domain policy.

use litreview_domain::{RevisionPolicy, SearchFilters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Papers requested from the backend per keyword.
    pub search_max_results: usize,
    /// Relevant papers kept per keyword.
    pub papers_per_keyword: usize,
    /// Corrective retries after a contract violation.
    pub parse_retries: u32,
    pub filters: SearchFilters,
    pub revision: RevisionPolicy,
    /// Stop after integration without running the revision loop.
    pub skip_revision: bool,
    /// Load knowledge stores before the run and save them afterwards.
    pub persist_knowledge: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            search_max_results: 30,
            papers_per_keyword: 10,
            parse_retries: 1,
            filters: SearchFilters::default(),
            revision: RevisionPolicy::default(),
            skip_revision: false,
            persist_knowledge: false,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_search_max_results(mut self, max: usize) -> Self {
        self.search_max_results = max;
        self
    }

    pub fn with_papers_per_keyword(mut self, max: usize) -> Self {
        self.papers_per_keyword = max;
        self
    }

    pub fn with_parse_retries(mut self, retries: u32) -> Self {
        self.parse_retries = retries;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_revision(mut self, policy: RevisionPolicy) -> Self {
        self.revision = policy;
        self
    }

    pub fn with_skip_revision(mut self, skip: bool) -> Self {
        self.skip_revision = skip;
        self
    }

    pub fn with_persist_knowledge(mut self, persist: bool) -> Self {
        self.persist_knowledge = persist;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PipelineParams::default();
        assert_eq!(params.parse_retries, 1);
        assert_eq!(params.papers_per_keyword, 10);
        assert_eq!(params.revision.max_cycles, 3);
        assert!(!params.skip_revision);
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_papers_per_keyword(2)
            .with_skip_revision(true);
        assert_eq!(params.papers_per_keyword, 2);
        assert!(params.skip_revision);
    }
}
