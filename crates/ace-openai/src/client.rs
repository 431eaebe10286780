//! Chat completions client

use ace_core::{decode_reply, CompletionProvider, ProviderError, ProviderResult, ResponseMap};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::OpenAiConfig;

/// Completion provider backed by an OpenAI-compatible HTTP API.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http_client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("ace-openai/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client: {e}")))?;

        Ok(OpenAiClient {
            config,
            http_client,
        })
    }

    /// Create client from `OPENAI_*` environment variables
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(OpenAiConfig::from_env())
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn request_body(&self, request: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": request}],
            "response_format": {"type": "json_object"},
            "temperature": 0.0,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                after_ms: u64::try_from(self.config.timeout().as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &str) -> ProviderResult<ResponseMap> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ProviderError::Configuration("OPENAI_API_KEY is not set".to_string())
        })?;

        debug!(
            model = %self.config.model,
            request_bytes = request.len(),
            "sending chat completion"
        );

        let response = self
            .http_client
            .post(self.config.endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(status_error(status, body));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        Ok(message_content(&body)
            .map(|content| decode_reply(&content))
            .unwrap_or_default())
    }
}

fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(body),
        _ => ProviderError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text of the first choice. `None` for bodies that are not a chat completion.
fn message_content(body: &str) -> Option<String> {
    serde_json::from_str::<ChatCompletion>(body)
        .ok()?
        .choices
        .into_iter()
        .next()?
        .message
        .content
}
