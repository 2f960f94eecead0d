//! Pipeline and revision loop configuration from TOML (`[pipeline]` section)

use litreview_domain::{DEFAULT_MAX_CYCLES, ExhaustionPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub max_revision_cycles: u32,
    /// "accept_with_caveats" or "fail_quality"
    pub on_exhaustion: String,
    /// Relevant papers kept per keyword
    pub papers_per_keyword: usize,
    /// Corrective retries after unparsable model output
    pub parse_retries: u32,
    pub skip_revision: bool,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            max_revision_cycles: DEFAULT_MAX_CYCLES,
            on_exhaustion: "accept_with_caveats".to_string(),
            papers_per_keyword: 10,
            parse_retries: 1,
            skip_revision: false,
        }
    }
}

impl FilePipelineConfig {
    pub fn parse_exhaustion(&self) -> Result<ExhaustionPolicy, String> {
        self.on_exhaustion.parse()
    }
}
