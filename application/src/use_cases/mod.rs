//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod generate_review;
pub mod role_operations;
pub mod run_pipeline;
pub mod run_revision;
pub mod shared;
