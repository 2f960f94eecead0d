//! Literature search port

use async_trait::async_trait;
use litreview_domain::{Paper, SearchFilters};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to parse search response: {0}")]
    Parse(String),

    #[error("Search backend unavailable: {0}")]
    Unavailable(String),
}

/// The papers returned by one search call.
///
/// A finite sequence consumed once by iteration. A failed search yields no
/// papers and carries the error, which callers read with
/// [`take_error`](Self::take_error) before iterating.
#[derive(Debug)]
pub struct SearchResults {
    papers: std::vec::IntoIter<Paper>,
    error: Option<SearchError>,
}

impl SearchResults {
    pub fn ok(papers: Vec<Paper>) -> Self {
        Self {
            papers: papers.into_iter(),
            error: None,
        }
    }

    pub fn failed(error: SearchError) -> Self {
        Self {
            papers: Vec::new().into_iter(),
            error: Some(error),
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<SearchError> {
        self.error.take()
    }
}

impl Iterator for SearchResults {
    type Item = Paper;

    fn next(&mut self) -> Option<Self::Item> {
        self.papers.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.papers.size_hint()
    }
}

/// Backend that finds papers for a query
#[async_trait]
pub trait LiteratureSearch: Send + Sync {
    /// Search for at most `max_results` papers. Never fails outright:
    /// errors come back inside [`SearchResults`].
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> SearchResults;
}

/// Search backend for runs without retrieval
pub struct NoSearch;

#[async_trait]
impl LiteratureSearch for NoSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _filters: &SearchFilters,
    ) -> SearchResults {
        SearchResults::failed(SearchError::Unavailable(
            "no search backend configured".to_string(),
        ))
    }
}
