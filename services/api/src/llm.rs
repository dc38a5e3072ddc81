use async_trait::async_trait;
use interview_core::Turn;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl ChatError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ChatError::Upstream { status, .. } => Some(*status),
            ChatError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// A chat-completions provider. Returns the content of the first choice,
/// `None` when the provider produced no content.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(
        &self,
        messages: &[Turn],
        max_tokens: Option<u32>,
    ) -> Result<Option<String>, ChatError>;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ChatCompletions for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: &[Turn],
        max_tokens: Option<u32>,
    ) -> Result<Option<String>, ChatError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
        };
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            ?max_tokens,
            "Requesting chat completion"
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let resp = resp.json::<LlmResponse>().await?;
        Ok(resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}
