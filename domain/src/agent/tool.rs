//! Tool references bound to roles and tasks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical name of the literature search tool.
pub const LITERATURE_SEARCH: &str = "literature_search";

/// A reference to a tool by name (Value Object)
///
/// Tools themselves live outside the domain; roles and tasks only carry
/// the names they are allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolRef(String);

impl ToolRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn literature_search() -> Self {
        Self::new(LITERATURE_SEARCH)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered set of tool references.
pub type ToolSet = BTreeSet<ToolRef>;
