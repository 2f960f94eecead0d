//! Model endpoint adapters implementing the `AgentExecutor` port.

mod openai;

pub use openai::{ModelEndpoint, OpenAiCompatibleExecutor};
