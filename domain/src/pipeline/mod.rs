//! The task pipeline: declarations, contracts, DAG validation and run records.
//!
//! - [`task::TaskSpec`]: a declared unit of work
//! - [`output::OutputContract`]: what a task must produce, and how raw
//!   model output is decoded against it
//! - [`graph::Pipeline`]: validated DAG with deterministic ordering
//! - [`run::PipelineRun`]: per-invocation results

pub mod graph;
pub mod output;
pub mod run;
pub mod task;
