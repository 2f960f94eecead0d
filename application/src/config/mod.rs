//! Application-level configuration.
//!
//! - [`PipelineParams`]: crew, retrieval and revision loop control

pub mod pipeline_params;

pub use pipeline_params::PipelineParams;
