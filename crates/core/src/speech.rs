use crate::error::SpeechError;
use std::fmt;

/// Identifies one `speak` call so that its finished notification can be
/// matched against what is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A source of finalized user utterances.
///
/// Implementations deliver each finalized phrase exactly once as
/// `SessionEvent::UtteranceReady` on the channel they were built with.
/// Partial recognition results never leave the adapter.
pub trait SpeechInput: Send {
    /// Begins capture. A no-op when already capturing.
    fn start(&mut self) -> Result<(), SpeechError>;

    /// Ends capture. Idempotent.
    fn stop(&mut self);

    fn is_recognizing(&self) -> bool;
}

/// Turns text into audible speech.
///
/// At most one utterance is audible at a time: `speak` truncates whatever is
/// playing, and the truncated utterance never reports completion. Natural
/// completion is reported once as `SessionEvent::SpeechFinished(id)`.
pub trait SpeechOutput: Send {
    fn speak(&mut self, text: &str) -> UtteranceId;

    /// Silences current playback without a finished notification.
    fn cancel(&mut self);

    fn is_speaking(&self) -> bool;
}

impl<T: SpeechInput + ?Sized> SpeechInput for Box<T> {
    fn start(&mut self) -> Result<(), SpeechError> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_recognizing(&self) -> bool {
        (**self).is_recognizing()
    }
}

impl<T: SpeechOutput + ?Sized> SpeechOutput for Box<T> {
    fn speak(&mut self, text: &str) -> UtteranceId {
        (**self).speak(text)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }
}
