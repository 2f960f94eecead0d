//! Literature records returned by the search backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A paper as returned by a literature search (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// `YYYY-MM-DD` when known
    pub published_date: Option<String>,
    pub url: Option<String>,
    pub categories: Vec<String>,
    /// Source-specific identifiers, e.g. `arxiv`, `doi`
    pub identifiers: BTreeMap<String, String>,
}

impl Paper {
    /// Stable key for knowledge stores.
    ///
    /// Prefers the arXiv id, then the DOI, then any other identifier, then
    /// the URL, then a normalised title.
    pub fn paper_id(&self) -> String {
        for key in ["arxiv", "doi"] {
            if let Some(id) = self.identifiers.get(key) {
                return id.clone();
            }
        }
        if let Some(id) = self.identifiers.values().next() {
            return id.clone();
        }
        if let Some(url) = &self.url {
            return url.clone();
        }
        self.title
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Publication year, when the date is known.
    pub fn year(&self) -> Option<&str> {
        self.published_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Sort order requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Newest,
}

/// Optional search restrictions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Subject categories (e.g. `cs.CL`); empty means any
    pub categories: Vec<String>,
    pub sort: SortOrder,
}

impl SearchFilters {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_id_prefers_arxiv() {
        let mut paper = Paper {
            title: "Attention Is All You Need".into(),
            url: Some("https://arxiv.org/abs/1706.03762".into()),
            ..Default::default()
        };
        paper.identifiers.insert("doi".into(), "10.1/x".into());
        paper.identifiers.insert("arxiv".into(), "1706.03762".into());
        assert_eq!(paper.paper_id(), "1706.03762");
    }

    #[test]
    fn test_paper_id_falls_back_to_title() {
        let paper = Paper {
            title: "  Deep   Learning ".into(),
            ..Default::default()
        };
        assert_eq!(paper.paper_id(), "deep-learning");
    }

    #[test]
    fn test_year() {
        let paper = Paper {
            published_date: Some("2017-06-12".into()),
            ..Default::default()
        };
        assert_eq!(paper.year(), Some("2017"));
        assert_eq!(Paper::default().year(), None);
    }

    #[test]
    fn test_abstract_serialized_name() {
        let paper = Paper {
            abstract_text: "We propose".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["abstract"], "We propose");
    }
}
