use thiserror::Error;

/// Failures reported by a speech input adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// The host has no usable speech capability. The session keeps running
    /// without voice input.
    #[error("speech input unavailable: {0}")]
    Unavailable(String),
    /// Capture failed in the middle of an utterance.
    #[error("speech recognition failed: {0}")]
    Recognition(String),
}

/// Failures of a single exchange with the dialogue backend.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request to dialogue backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Everything the session controller can surface through `last_error`.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error("exchange failed: {0}")]
    Backend(DialogueError),
    #[error("evaluation failed: {0}")]
    Evaluation(DialogueError),
}
