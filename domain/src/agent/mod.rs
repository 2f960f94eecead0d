//! Agent roles and the tools they may use.

pub mod role;
pub mod tool;
