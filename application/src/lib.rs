//! Application layer for litreview
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::PipelineParams;
pub use ports::{
    agent_executor::{AgentExecutor, ExecutionError},
    artifact_sink::{ArtifactError, ArtifactSink, NoArtifacts},
    knowledge_archive::{KnowledgeArchive, StoreError},
    literature_search::{LiteratureSearch, NoSearch, SearchError, SearchResults},
    progress::{NoProgress, PipelineProgress},
    run_journal::{NoJournal, RunEvent, RunJournal},
};
pub use use_cases::generate_review::{GenerateReviewError, GenerateReviewUseCase, ReviewReport};
pub use use_cases::role_operations::ResearchTeam;
pub use use_cases::run_pipeline::RunPipelineUseCase;
pub use use_cases::run_revision::{RevisionOutcome, RunRevisionUseCase};
pub use use_cases::shared::{StageFailure, StageResult};
