//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, LlmError, TextCompletion};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl LlmConfig {
    /// Load provider settings from environment variables.
    ///
    /// | Env Var           | Required | Default                     |
    /// |-------------------|----------|-----------------------------|
    /// | `OPENAI_API_KEY`  | **yes**  | --                          |
    /// | `OPENAI_BASE_URL` | no       | `https://api.openai.com/v1` |
    /// | `OPENAI_MODEL`    | no       | `gpt-4o`                    |
    ///
    /// # Panics
    ///
    /// Panics if `OPENAI_API_KEY` is not set or is empty.
    pub fn from_env() -> Self {
        let api_key =
            std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set in the environment");
        assert!(!api_key.is_empty(), "OPENAI_API_KEY must not be empty");

        Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, mut config: LlmConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {e}>"));
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl TextCompletion for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = Self::ensure_success(response).await?.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(model = %self.config.model, chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn client(base_url: String) -> OpenAiClient {
        OpenAiClient::new(LlmConfig {
            api_key: "sk-test".into(),
            base_url,
            model: DEFAULT_MODEL.into(),
        })
    }

    #[tokio::test]
    async fn sends_chat_request_and_returns_content() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o");
                assert_eq!(body["max_tokens"], 500);
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "Knee angle 90");
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "1. Bend more."}}]
                }))
            }),
        );
        let client = client(serve(router).await);

        let reply = client
            .complete(&CompletionRequest::new("You are a coach.", "Knee angle 90"))
            .await
            .unwrap();
        assert_eq!(reply, "1. Bend more.");
    }

    #[tokio::test]
    async fn provider_errors_carry_status_and_body() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let client = client(serve(router).await);

        let err = client
            .complete(&CompletionRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert_matches!(err, LlmError::ApiError { status: 429, body } if body == "quota exceeded");
    }

    #[tokio::test]
    async fn missing_content_is_empty_response() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let client = client(serve(router).await);

        let err = client
            .complete(&CompletionRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert_matches!(err, LlmError::EmptyResponse);
    }

    #[test]
    fn request_defaults_match_coaching_settings() {
        let request = CompletionRequest::new("system", "user");
        assert_eq!(request.temperature, 0.8);
        assert_eq!(request.max_tokens, 500);
    }
}
