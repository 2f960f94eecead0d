//! CLI command definitions

use clap::Parser;
use litreview_domain::{ExhaustionPolicy, OutputFormat};
use std::path::PathBuf;

/// CLI arguments for litreview
#[derive(Parser, Debug)]
#[command(name = "litreview")]
#[command(author, version, about = "Multi-role literature review generation")]
#[command(long_about = r#"
litreview drafts a literature review on a topic with a team of four model
roles: a professor frames the review, a postdoc refines it and picks search
keywords, a PhD student searches arXiv and writes the draft, and a reviewer
runs revision cycles until the draft is accepted.

Configuration files are loaded from (in priority order):
1. LITREVIEW_* environment variables (e.g. LITREVIEW_MODEL__MODEL)
2. --config <path>          Explicit config file
3. ./litreview.toml         Project-level config
4. ~/.config/litreview/config.toml   Global config

Example:
  litreview "retrieval-augmented generation"
  litreview --max-cycles 5 --on-exhaustion fail-quality "graph neural networks"
  litreview -o json --output-dir reviews/rag "retrieval-augmented generation"
"#)]
pub struct Cli {
    /// The research topic to review
    #[arg(required_unless_present = "show_config")]
    pub topic: Option<String>,

    /// Output format: full, summary or json
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Directory for stage artifacts and the report
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Model name sent to the endpoint
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Restrict the literature search to an arXiv category (repeatable)
    #[arg(long = "category", value_name = "CAT")]
    pub categories: Vec<String>,

    /// Maximum revision cycles before the exhaustion policy applies
    #[arg(long, value_name = "N")]
    pub max_cycles: Option<u32>,

    /// What to do when revision cycles run out: accept-with-caveats or fail-quality
    #[arg(long, value_name = "POLICY")]
    pub on_exhaustion: Option<ExhaustionPolicy>,

    /// Stop after the pipeline and final review, without revision cycles
    #[arg(long)]
    pub skip_revision: bool,

    /// Load and save per-role knowledge stores
    #[arg(long)]
    pub persist_knowledge: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
