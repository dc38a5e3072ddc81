//! Console stand-ins for the speech adapters.
//!
//! The terminal plays both roles: lines typed while the simulated microphone
//! is armed are the recognizer's finalized utterances, and interviewer replies
//! are "spoken" by printing them and holding the floor for as long as reading
//! them aloud would take.

use interview_core::{SessionEvent, SpeechError, SpeechInput, SpeechOutput, UtteranceId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Lower bound on simulated playback so that one-word replies still register.
pub const MIN_PLAYBACK: Duration = Duration::from_millis(500);

/// Simulated microphone. Shares its capture flag with [`ConsoleTranscriber`].
pub struct ConsoleSpeechInput {
    recognizing: Arc<AtomicBool>,
}

/// Turns typed lines into finalized utterances while capture is active.
#[derive(Clone)]
pub struct ConsoleTranscriber {
    recognizing: Arc<AtomicBool>,
}

pub fn console_input() -> (ConsoleSpeechInput, ConsoleTranscriber) {
    let recognizing = Arc::new(AtomicBool::new(false));
    (
        ConsoleSpeechInput {
            recognizing: Arc::clone(&recognizing),
        },
        ConsoleTranscriber { recognizing },
    )
}

impl SpeechInput for ConsoleSpeechInput {
    fn start(&mut self) -> Result<(), SpeechError> {
        if !self.recognizing.swap(true, Ordering::SeqCst) {
            tracing::debug!("Microphone armed.");
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.recognizing.store(false, Ordering::SeqCst);
    }

    fn is_recognizing(&self) -> bool {
        self.recognizing.load(Ordering::SeqCst)
    }
}

impl ConsoleTranscriber {
    /// Yields the utterance event for `line` if the microphone is armed.
    /// Capture ends with the finalized phrase, so each arming produces at
    /// most one utterance.
    pub fn transcribe(&self, line: &str) -> Option<SessionEvent> {
        if self.recognizing.swap(false, Ordering::SeqCst) {
            Some(SessionEvent::UtteranceReady(line.to_string()))
        } else {
            None
        }
    }

    pub fn is_listening(&self) -> bool {
        self.recognizing.load(Ordering::SeqCst)
    }
}

/// Speech input for hosts without a recognizer.
pub struct UnavailableSpeechInput {
    reason: String,
}

impl UnavailableSpeechInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechInput for UnavailableSpeechInput {
    fn start(&mut self) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn stop(&mut self) {}

    fn is_recognizing(&self) -> bool {
        false
    }
}

/// Prints replies and reports `SpeechFinished` once the simulated playback
/// time has passed.
pub struct ConsoleSpeechOutput {
    events: mpsc::Sender<SessionEvent>,
    words_per_minute: u32,
    next_id: u64,
    // Id of the utterance playing right now, 0 when silent.
    current: Arc<AtomicU64>,
    playback: Option<CancellationToken>,
}

impl ConsoleSpeechOutput {
    pub fn new(events: mpsc::Sender<SessionEvent>, words_per_minute: u32) -> Self {
        Self {
            events,
            words_per_minute: words_per_minute.max(1),
            next_id: 0,
            current: Arc::new(AtomicU64::new(0)),
            playback: None,
        }
    }
}

impl SpeechOutput for ConsoleSpeechOutput {
    fn speak(&mut self, text: &str) -> UtteranceId {
        self.cancel();
        self.next_id += 1;
        let id = self.next_id;
        self.current.store(id, Ordering::SeqCst);

        println!("\nInterviewer: {text}\n");

        let token = CancellationToken::new();
        self.playback = Some(token.clone());
        let delay = playback_time(text, self.words_per_minute);
        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Only the utterance still on air may report completion.
                    if current
                        .compare_exchange(id, 0, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                        && events.send(SessionEvent::SpeechFinished(UtteranceId(id))).await.is_err()
                    {
                        tracing::debug!("Controller gone before utterance #{id} finished.");
                    }
                }
            }
        });

        UtteranceId(id)
    }

    fn cancel(&mut self) {
        if let Some(token) = self.playback.take() {
            token.cancel();
        }
        self.current.store(0, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.current.load(Ordering::SeqCst) != 0
    }
}

/// How long reading `text` aloud takes at `words_per_minute`.
pub fn playback_time(text: &str, words_per_minute: u32) -> Duration {
    let words = text.split_whitespace().count() as u64;
    let millis = words * 60_000 / u64::from(words_per_minute.max(1));
    Duration::from_millis(millis).max(MIN_PLAYBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_time_scales_with_word_count() {
        assert_eq!(playback_time("", 170), MIN_PLAYBACK);
        assert_eq!(playback_time("Hi.", 120), MIN_PLAYBACK);
        let sentence = "one two three four five six seven eight nine ten";
        assert_eq!(playback_time(sentence, 120), Duration::from_secs(5));
    }

    #[test]
    fn transcriber_only_hears_armed_lines() {
        let (mut input, transcriber) = console_input();

        assert_eq!(transcriber.transcribe("too early"), None);

        input.start().unwrap();
        assert!(input.is_recognizing());
        assert_eq!(
            transcriber.transcribe("I write Rust"),
            Some(SessionEvent::UtteranceReady("I write Rust".into()))
        );
        assert!(!input.is_recognizing(), "capture ends with the utterance");
        assert_eq!(transcriber.transcribe("again"), None);
    }

    #[test]
    fn unavailable_input_refuses_to_start() {
        let mut input = UnavailableSpeechInput::new("voice disabled");
        let err = input.start().unwrap_err();
        assert_eq!(err, SpeechError::Unavailable("voice disabled".into()));
        assert!(!input.is_recognizing());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_playback_is_reported_once() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut output = ConsoleSpeechOutput::new(tx, 170);

        let id = output.speak("Tell me about yourself.");
        assert!(output.is_speaking());

        assert_eq!(rx.recv().await, Some(SessionEvent::SpeechFinished(id)));
        assert!(!output.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn truncated_utterance_never_reports_completion() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut output = ConsoleSpeechOutput::new(tx, 170);

        let first = output.speak("A long question that will be interrupted by another.");
        let second = output.speak("Next.");
        assert_ne!(first, second);

        assert_eq!(rx.recv().await, Some(SessionEvent::SpeechFinished(second)));
        let late = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(late.is_err(), "unexpected event: {late:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_silences_without_notification() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut output = ConsoleSpeechOutput::new(tx, 170);

        output.speak("Never mind.");
        output.cancel();
        assert!(!output.is_speaking());

        let event = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(event.is_err(), "unexpected event: {event:?}");
    }
}
