pub mod controller;
pub mod dialogue;
pub mod error;
pub mod prompts;
pub mod session;
pub mod speech;
pub mod transcript;

pub use controller::{SessionController, SessionEvent};
pub use dialogue::{DialogueClient, HttpDialogueClient};
pub use error::{DialogueError, InterviewError, SpeechError};
pub use session::{Session, SessionConfig, SessionStatus};
pub use speech::{SpeechInput, SpeechOutput, UtteranceId};
pub use transcript::{Role, Transcript, Turn};
