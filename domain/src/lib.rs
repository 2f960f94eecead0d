//! Domain layer for litreview
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Pipeline
//!
//! A review is a DAG of [`TaskSpec`]s. Each task names the role that runs
//! it, the tasks whose results it consumes (`context`) and an
//! [`OutputContract`] its raw output is decoded against. [`Pipeline`]
//! validates the graph once; [`PipelineRun`] records what happened.
//!
//! ## Roles
//!
//! Four fixed [`RoleKind`]s (professor, postdoc, phd, reviewer), each with
//! an [`AgentRole`] profile and its own [`KnowledgeStore`].
//!
//! ## Revision loop
//!
//! [`RevisionMachine`] drives review → suggestions → revision → check until
//! the draft is accepted or the cycle budget is spent.

pub mod agent;
pub mod config;
pub mod core;
pub mod knowledge;
pub mod literature;
pub mod pipeline;
pub mod prompt;
pub mod revision;
pub mod workflow;

// Re-export commonly used types
pub use agent::{
    role::{AgentRole, RoleKind, RoleRoster},
    tool::{LITERATURE_SEARCH, ToolRef, ToolSet},
};
pub use config::OutputFormat;
pub use core::{
    error::DomainError,
    topic::{Topic, require_text, require_value},
};
pub use knowledge::{KnowledgeEntry, KnowledgeStore, KnowledgeStores};
pub use literature::{Paper, SearchFilters, SortOrder};
pub use pipeline::{
    graph::Pipeline,
    output::{OutputContract, ParseError, TaskOutput},
    run::{PipelineRun, RunStatus, TaskOutcome},
    task::{TaskId, TaskKind, TaskSpec, TaskStatus},
};
pub use prompt::PromptTemplate;
pub use revision::{
    DEFAULT_MAX_CYCLES, ExhaustionPolicy, NewIssue, PendingSuggestion, RevisionCheck,
    RevisionCycle, RevisionMachine, RevisionPolicy, RevisionState, Severity, Suggestion,
    SuggestionSet,
};
pub use workflow::LiteratureReviewWorkflow;
