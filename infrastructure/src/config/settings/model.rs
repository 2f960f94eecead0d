//! Model endpoint configuration from TOML (`[model]` section)

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat endpoint settings
///
/// # Example
///
/// ```toml
/// [model]
/// base_url = "http://localhost:11434/v1"
/// model = "llama3.1"
/// api_key_env = "OLLAMA_API_KEY"
/// timeout_seconds = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Base URL up to and including the API version segment
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead)
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 120,
            temperature: 0.7,
        }
    }
}

impl FileModelConfig {
    /// The configured key, falling back to the named environment variable.
    /// Local endpoints commonly need none.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
