//! Progress display for review runs

pub mod reporter;
