use crate::error::DialogueError;
use crate::transcript::Turn;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of a call to the interview backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub evaluate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub reply: String,
}

/// The only network boundary of the session controller: given the ordered
/// transcript, return the next message.
///
/// `evaluate = false` asks for the next (short) interview question,
/// `evaluate = true` asks for the final structured evaluation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DialogueClient: Send + Sync {
    async fn exchange(&self, history: &[Turn], evaluate: bool) -> Result<String, DialogueError>;
}

/// Talks to the `/api/interview` endpoint of the interview backend.
pub struct HttpDialogueClient {
    client: Client,
    endpoint: String,
}

impl HttpDialogueClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DialogueError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DialogueClient for HttpDialogueClient {
    async fn exchange(&self, history: &[Turn], evaluate: bool) -> Result<String, DialogueError> {
        let request = DialogueRequest {
            history: history.to_vec(),
            evaluate,
        };
        tracing::debug!(
            turns = history.len(),
            evaluate,
            "Sending exchange to {}",
            self.endpoint
        );

        let resp = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DialogueError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: DialogueResponse = resp
            .json()
            .await
            .map_err(|e| DialogueError::Malformed(e.to_string()))?;
        Ok(body.reply)
    }
}
