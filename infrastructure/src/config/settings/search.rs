//! Literature search configuration from TOML (`[search]` section)

use litreview_domain::{SearchFilters, SortOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSearchConfig {
    /// Papers requested per keyword query
    pub max_results: usize,
    /// arXiv subject categories such as `cs.CL`; empty searches all
    pub categories: Vec<String>,
    pub sort: SortOrder,
}

impl Default for FileSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 30,
            categories: Vec::new(),
            sort: SortOrder::default(),
        }
    }
}

impl FileSearchConfig {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            categories: self.categories.clone(),
            sort: self.sort,
        }
    }
}
