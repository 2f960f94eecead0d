//! Port definitions (interfaces for external dependencies)
//!
//! These traits define the boundaries between the application layer
//! and the infrastructure/presentation layers.

pub mod agent_executor;
pub mod artifact_sink;
pub mod knowledge_archive;
pub mod literature_search;
pub mod progress;
pub mod run_journal;
