//! Literature search backends.

mod arxiv;

pub use arxiv::{ARXIV_API_BASE, ArxivSearch};
