use crate::llm::{ChatCompletions, ChatError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use interview_core::dialogue::{DialogueRequest, DialogueResponse};
use interview_core::prompts::EVALUATOR_PROMPT;
use interview_core::Turn;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub const QUESTION_MAX_TOKENS: u32 = 256;
pub const EVALUATION_MAX_TOKENS: u32 = 512;
pub const NO_RESPONSE: &str = "No response.";
pub const NO_EVALUATION: &str = "No evaluation returned.";

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<dyn ChatCompletions>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub evaluation: String,
}

/// Failure surfaced to callers as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = err
            .upstream_status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Builds the backend router with permissive CORS.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/interview", post(interview))
        .route("/api/evaluate", post(evaluate))
        .layer(cors)
        .with_state(state)
}

/// One conversational exchange: the ordered history goes to the model
/// verbatim and the first choice comes back as `reply`.
async fn interview(
    State(state): State<AppState>,
    payload: Result<Json<DialogueRequest>, JsonRejection>,
) -> Result<Json<DialogueResponse>, ApiError> {
    let Json(request) = payload?;
    let max_tokens = if request.evaluate {
        EVALUATION_MAX_TOKENS
    } else {
        QUESTION_MAX_TOKENS
    };
    tracing::info!(
        turns = request.history.len(),
        evaluate = request.evaluate,
        "Interview exchange"
    );

    let content = state
        .chat
        .complete(&request.history, Some(max_tokens))
        .await
        .inspect_err(|e| tracing::error!("Interview exchange failed: {e}"))?;

    Ok(Json(DialogueResponse {
        reply: non_empty_or(content, NO_RESPONSE),
    }))
}

async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(chars = request.transcript.len(), "Batch evaluation");

    let messages = [
        Turn::system(EVALUATOR_PROMPT),
        Turn::user(format!(
            "Here is the full transcript of the interview:\n\n{}",
            request.transcript
        )),
    ];
    let content = state.chat.complete(&messages, None).await.map_err(|e| {
        tracing::error!("Evaluation failed: {e}");
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(EvaluateResponse {
        evaluation: non_empty_or(content, NO_EVALUATION),
    }))
}

fn non_empty_or(content: Option<String>, fallback: &str) -> String {
    content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatCompletions;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use interview_core::Role;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_with(mock: MockChatCompletions) -> Router {
        app(AppState {
            chat: Arc::new(mock),
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn interview_forwards_history_with_question_budget() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete()
            .withf(|messages, max_tokens| {
                messages.len() == 2
                    && messages[0].role == Role::System
                    && *max_tokens == Some(QUESTION_MAX_TOKENS)
            })
            .times(1)
            .returning(|_, _| Ok(Some("Tell me about yourself.".to_string())));

        let (status, body) = post_json(
            app_with(mock),
            "/api/interview",
            json!({
                "history": [
                    {"role": "system", "content": "You are an interviewer."},
                    {"role": "user", "content": "Let's begin the interview."}
                ],
                "evaluate": false
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"reply": "Tell me about yourself."}));
    }

    #[tokio::test]
    async fn evaluate_flag_raises_the_token_budget() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete()
            .withf(|_, max_tokens| *max_tokens == Some(EVALUATION_MAX_TOKENS))
            .times(1)
            .returning(|_, _| Ok(Some("Communication: 8/10".to_string())));

        let (status, body) = post_json(
            app_with(mock),
            "/api/interview",
            json!({"history": [{"role": "user", "content": "Please generate a final evaluation."}], "evaluate": true}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Communication: 8/10");
    }

    #[tokio::test]
    async fn missing_fields_default_and_empty_content_falls_back() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete()
            .withf(|messages, max_tokens| {
                messages.is_empty() && *max_tokens == Some(QUESTION_MAX_TOKENS)
            })
            .times(1)
            .returning(|_, _| Ok(None));

        let (status, body) = post_json(app_with(mock), "/api/interview", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"reply": NO_RESPONSE}));
    }

    #[tokio::test]
    async fn upstream_failure_keeps_status_and_reports_error() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete().returning(|_, _| {
            Err(ChatError::Upstream {
                status: 503,
                message: "model overloaded".to_string(),
            })
        });

        let (status, body) = post_json(app_with(mock), "/api/interview", json!({"history": []})).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({"error": "model overloaded"}));
    }

    #[tokio::test]
    async fn evaluate_wraps_transcript_for_the_evaluator() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete()
            .withf(|messages, max_tokens| {
                max_tokens.is_none()
                    && messages.len() == 2
                    && messages[0].content == EVALUATOR_PROMPT
                    && messages[1].content
                        == "Here is the full transcript of the interview:\n\nuser: hi"
            })
            .times(1)
            .returning(|_, _| Ok(Some("Hire.".to_string())));

        let (status, body) = post_json(
            app_with(mock),
            "/api/evaluate",
            json!({"transcript": "user: hi"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"evaluation": "Hire."}));
    }

    #[tokio::test]
    async fn evaluate_failures_are_internal_errors() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete().returning(|_, _| {
            Err(ChatError::Upstream {
                status: 401,
                message: "invalid api key".to_string(),
            })
        });

        let (status, body) =
            post_json(app_with(mock), "/api/evaluate", json!({"transcript": "x"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "invalid api key"}));
    }

    #[tokio::test]
    async fn blank_evaluation_falls_back() {
        let mut mock = MockChatCompletions::new();
        mock.expect_complete()
            .returning(|_, _| Ok(Some("   ".to_string())));

        let (_, body) = post_json(app_with(mock), "/api/evaluate", json!({})).await;

        assert_eq!(body, json!({"evaluation": NO_EVALUATION}));
    }
}
