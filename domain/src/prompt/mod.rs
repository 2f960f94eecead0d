//! Prompt domain
//!
//! Templates for every role operation and for crew-rendered task prompts.

mod template;

pub use template::PromptTemplate;
