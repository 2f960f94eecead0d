//! OpenAI-compatible chat completions executor.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, vLLM, Ollama, LM Studio). Each call is a single-turn
//! conversation: the role description as the system message and the task
//! prompt as the user message.

use async_trait::async_trait;
use litreview_application::ports::agent_executor::{AgentExecutor, ExecutionError};
use litreview_domain::core::string::truncate;
use litreview_domain::{AgentRole, ToolSet};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Where and how to reach the model
#[derive(Clone)]
pub struct ModelEndpoint {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
}

impl fmt::Debug for ModelEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEndpoint")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ModelEndpoint {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_secs(120),
            temperature: 0.7,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// [`AgentExecutor`] speaking the OpenAI chat completions protocol
pub struct OpenAiCompatibleExecutor {
    client: Client,
    endpoint: ModelEndpoint,
}

impl OpenAiCompatibleExecutor {
    pub fn new(endpoint: ModelEndpoint) -> Result<Self, ExecutionError> {
        let client = Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| {
                ExecutionError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &ModelEndpoint {
        &self.endpoint
    }

    /// Role description plus the tools the role may use on this task.
    fn system_message(role: &AgentRole, tools: &ToolSet) -> String {
        let mut message = role.system_prompt();
        if !tools.is_empty() {
            let names: Vec<&str> = tools.iter().map(|t| t.as_str()).collect();
            message.push_str(&format!("\nAvailable tools: {}", names.join(", ")));
        }
        message
    }

    fn map_send_error(e: reqwest::Error) -> ExecutionError {
        if e.is_timeout() {
            ExecutionError::Timeout
        } else if e.is_connect() {
            ExecutionError::ConnectionError(e.to_string())
        } else {
            ExecutionError::RequestFailed(e.to_string())
        }
    }
}

/// Provider message from an error body, truncated; never echoes keys.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let lower = message.to_lowercase();
    if lower.contains("api key") || lower.contains("unauthorized") {
        return "authentication failed; check the configured API key".to_string();
    }
    truncate(&message, 300)
}

#[async_trait]
impl AgentExecutor for OpenAiCompatibleExecutor {
    async fn execute(
        &self,
        role: &AgentRole,
        prompt: &str,
        tools: &ToolSet,
    ) -> Result<String, ExecutionError> {
        let system = Self::system_message(role, tools);
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.endpoint.temperature,
        };

        debug!(
            "Sending {} byte prompt for {} to {}",
            prompt.len(),
            role.kind,
            self.endpoint.model
        );

        let mut builder = self.client.post(self.endpoint.completions_url()).json(&request);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(Self::map_send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(Self::map_send_error)?;
        if !status.is_success() {
            return Err(ExecutionError::RequestFailed(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExecutionError::InvalidResponse("no content in response".to_string()))?;

        debug!("Received {} bytes from {}", content.len(), self.endpoint.model);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_domain::ToolRef;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request body.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (header_end, content_length) = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let length = text[..pos]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    break (pos + 4, length);
                }
            };
            while buf.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[header_end..]).to_string()
        });

        (url, handle)
    }

    fn executor(url: String) -> OpenAiCompatibleExecutor {
        OpenAiCompatibleExecutor::new(
            ModelEndpoint::new(url, "test-model").with_api_key(Some("sk-test".into())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_first_choice_content() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"relevant\": true}"}}]}"#,
        )
        .await;

        let mut tools = ToolSet::new();
        tools.insert(ToolRef::literature_search());
        let reply = executor(url)
            .execute(&AgentRole::phd(), "Is this relevant?", &tools)
            .await
            .unwrap();
        assert_eq!(reply, r#"{"relevant": true}"#);

        let request: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(request["model"], "test-model");
        assert_eq!(request["messages"][0]["role"], "system");
        assert!(
            request["messages"][0]["content"]
                .as_str()
                .unwrap()
                .contains("Available tools: literature_search")
        );
        assert_eq!(request["messages"][1]["content"], "Is this relevant?");
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_failed() {
        let (url, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"error": {"message": "model overloaded"}}"#,
        )
        .await;

        let err = executor(url)
            .execute(&AgentRole::reviewer(), "prompt", &ToolSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::RequestFailed(ref m) if m.contains("model overloaded")));
    }

    #[tokio::test]
    async fn test_missing_choices_is_invalid_response() {
        let (url, _server) = serve_once("200 OK", r#"{"choices": []}"#).await;

        let err = executor(url)
            .execute(&AgentRole::reviewer(), "prompt", &ToolSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());
        drop(listener);

        let err = executor(url)
            .execute(&AgentRole::reviewer(), "prompt", &ToolSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ConnectionError(_)));
    }

    #[test]
    fn test_error_message_hides_auth_details() {
        let body = r#"{"error": {"message": "Incorrect API key provided: sk-abc"}}"#;
        assert!(!error_message(body).contains("sk-abc"));
        assert_eq!(error_message("plain failure "), "plain failure");
    }

    #[test]
    fn test_debug_masks_api_key() {
        let endpoint =
            ModelEndpoint::new("http://localhost/v1", "m").with_api_key(Some("sk-secret".into()));
        assert!(!format!("{:?}", endpoint).contains("sk-secret"));
        assert_eq!(endpoint.completions_url(), "http://localhost/v1/chat/completions");
    }
}
