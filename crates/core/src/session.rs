use crate::prompts;
use crate::transcript::Transcript;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Ten minutes.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Evaluating,
    Finished,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Evaluating => "evaluating",
            SessionStatus::Finished => "finished",
        }
    }
}

/// Snapshot of the interview as seen by observers.
///
/// The controller holds the only writable copy; everything handed out
/// through `SessionController::subscribe` is a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub remaining: Duration,
    pub transcript: Transcript,
    pub last_utterance: String,
    pub evaluation: Option<String>,
    pub last_error: Option<String>,
    /// Speech input is capturing.
    pub recognizing: bool,
    /// Speech output is playing.
    pub speaking: bool,
}

impl Session {
    pub fn new(duration: Duration) -> Self {
        Self {
            status: SessionStatus::Idle,
            started_at: None,
            remaining: duration,
            transcript: Transcript::new(),
            last_utterance: String::new(),
            evaluation: None,
            last_error: None,
            recognizing: false,
            speaking: false,
        }
    }
}

/// Externally supplied knobs consumed by the controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub duration: Duration,
    pub system_prompt: String,
    pub evaluation_rubric: String,
    pub opening_line: String,
    pub evaluation_request: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SESSION_DURATION,
            system_prompt: prompts::SYSTEM_PROMPT.to_string(),
            evaluation_rubric: prompts::EVALUATION_RUBRIC.to_string(),
            opening_line: prompts::OPENING_LINE.to_string(),
            evaluation_request: prompts::EVALUATION_REQUEST.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_evaluation_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.evaluation_rubric = rubric.into();
        self
    }
}
