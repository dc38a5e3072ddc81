use interview_core::{DialogueError, Transcript};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    transcript: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    evaluation: String,
}

/// One-shot evaluation of a finished transcript through `/api/evaluate`.
pub struct BatchEvaluator {
    client: Client,
    endpoint: String,
}

impl BatchEvaluator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DialogueError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub async fn evaluate(&self, transcript: &str) -> Result<String, DialogueError> {
        tracing::info!("Requesting batch evaluation from {}", self.endpoint);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EvaluateRequest { transcript })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DialogueError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: EvaluateResponse = resp
            .json()
            .await
            .map_err(|e| DialogueError::Malformed(e.to_string()))?;
        Ok(body.evaluation)
    }
}

/// Accepts either a saved transcript (JSON array of turns) or plain text.
pub fn transcript_text(raw: &str) -> String {
    match serde_json::from_str::<Transcript>(raw) {
        Ok(transcript) => transcript.render_plain(),
        Err(_) => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn saved_transcripts_drop_system_turns() {
        let raw = json!([
            {"role": "system", "content": "hidden"},
            {"role": "user", "content": "Let's begin the interview."},
            {"role": "assistant", "content": "Tell me about yourself."}
        ])
        .to_string();

        assert_eq!(
            transcript_text(&raw),
            "user: Let's begin the interview.\nassistant: Tell me about yourself."
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(transcript_text("  Q: hi\nA: hello \n"), "Q: hi\nA: hello");
    }

    #[tokio::test]
    async fn posts_transcript_and_returns_evaluation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/evaluate"))
            .and(body_json(json!({"transcript": "user: hi"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"evaluation": "Hire."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let evaluator = BatchEvaluator::new(
            format!("{}/api/evaluate", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(evaluator.evaluate("user: hi").await.unwrap(), "Hire.");
    }

    #[tokio::test]
    async fn backend_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "no key"})),
            )
            .mount(&server)
            .await;

        let evaluator = BatchEvaluator::new(
            format!("{}/api/evaluate", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = evaluator.evaluate("user: hi").await.unwrap_err();

        assert!(matches!(err, DialogueError::Status { status: 500, .. }));
    }
}
