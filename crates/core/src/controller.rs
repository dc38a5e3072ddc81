//! The interview session state machine.
//!
//! `SessionController` owns the only writable [`Session`] and drives the
//! conversation: it seeds the transcript, runs exactly one exchange with the
//! dialogue backend at a time, alternates speech output and speech input, and
//! watches the wall-clock deadline. Everything reaches it as an event
//! (from the UI, the speech adapters, finished exchanges, or the ticker) and
//! is applied one at a time, so no locking is needed around the session.

use crate::dialogue::DialogueClient;
use crate::error::{DialogueError, InterviewError, SpeechError};
use crate::session::{Session, SessionConfig, SessionStatus};
use crate::speech::{SpeechInput, SpeechOutput, UtteranceId};
use crate::transcript::Turn;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Resolution of the session timer.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Triggers accepted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Start a session from Idle or Finished. Ignored while one is active.
    Start,
    /// Throw away whatever is going on and start over.
    Restart,
    /// End the interview early and ask for the evaluation.
    Finish,
    /// Manually arm speech input (the microphone button).
    Listen,
    /// A finalized utterance from speech input, or a typed answer.
    UtteranceReady(String),
    /// Speech input failed mid-utterance.
    RecognitionFailed(String),
    /// Speech output finished playing the given utterance.
    SpeechFinished(UtteranceId),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeKind {
    Conversation,
    Evaluation,
}

struct InFlight {
    ticket: u64,
    kind: ExchangeKind,
    handle: JoinHandle<()>,
}

struct ExchangeCompletion {
    ticket: u64,
    result: Result<String, DialogueError>,
}

pub struct SessionController<I, O> {
    config: SessionConfig,
    dialogue: Arc<dyn DialogueClient>,
    input: I,
    output: O,
    session: Session,
    deadline: Option<Instant>,
    // At most one exchange is outstanding per session.
    in_flight: Option<InFlight>,
    // Utterances that arrived while the interviewer was busy.
    queued: VecDeque<String>,
    speaking: Option<UtteranceId>,
    evaluation_requested: bool,
    input_unavailable: bool,
    next_ticket: u64,
    completions_tx: mpsc::UnboundedSender<ExchangeCompletion>,
    completions_rx: mpsc::UnboundedReceiver<ExchangeCompletion>,
    observers: watch::Sender<Session>,
}

impl<I: SpeechInput, O: SpeechOutput> SessionController<I, O> {
    pub fn new(config: SessionConfig, dialogue: Arc<dyn DialogueClient>, input: I, output: O) -> Self {
        let session = Session::new(config.duration);
        let (observers, _) = watch::channel(session.clone());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            config,
            dialogue,
            input,
            output,
            session,
            deadline: None,
            in_flight: None,
            queued: VecDeque::new(),
            speaking: None,
            evaluation_requested: false,
            input_unavailable: false,
            next_ticket: 0,
            completions_tx,
            completions_rx,
            observers,
        }
    }

    /// Read-only view of the session. Every applied event publishes a new
    /// snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.observers.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Processes events, exchange results and timer ticks until `Shutdown`
    /// arrives or every event sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!("Session controller running.");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Shutdown) | None => break,
                    Some(event) => self.handle(event),
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion);
                    self.publish();
                }
                _ = ticker.tick() => {
                    self.tick(Instant::now());
                    self.publish();
                }
            }
        }

        self.shutdown();
        self.publish();
        tracing::info!("Session controller stopped.");
    }

    /// Applies a single event and publishes the resulting snapshot.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Start => self.start(),
            SessionEvent::Restart => self.restart(),
            SessionEvent::Finish => self.finish(),
            SessionEvent::Listen => self.listen(),
            SessionEvent::UtteranceReady(text) => self.utterance_ready(text),
            SessionEvent::RecognitionFailed(reason) => {
                self.record_error(SpeechError::Recognition(reason).into());
            }
            SessionEvent::SpeechFinished(id) => self.speech_finished(id),
            SessionEvent::Shutdown => self.shutdown(),
        }
        self.publish();
    }

    fn start(&mut self) {
        match self.session.status {
            SessionStatus::Idle | SessionStatus::Finished => self.restart(),
            status => {
                tracing::debug!("Start ignored, session is {}.", status.as_str());
            }
        }
    }

    fn restart(&mut self) {
        self.silence();
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!("Aborting exchange #{} for restart.", previous.ticket);
            previous.handle.abort();
        }
        self.queued.clear();
        self.evaluation_requested = false;
        self.deadline = Some(Instant::now() + self.config.duration);

        let session = &mut self.session;
        session.status = SessionStatus::Running;
        session.started_at = Some(Utc::now());
        session.remaining = self.config.duration;
        session.transcript.seed(self.config.system_prompt.clone());
        session.transcript.append(Turn::user(self.config.opening_line.clone()));
        session.last_utterance.clear();
        session.evaluation = None;
        session.last_error = None;

        tracing::info!(
            "Interview started with {}s on the clock.",
            self.config.duration.as_secs()
        );
        self.dispatch(ExchangeKind::Conversation);
    }

    fn finish(&mut self) {
        if self.session.status == SessionStatus::Running {
            tracing::info!("Interview finished early.");
            self.begin_evaluation();
        } else {
            tracing::debug!("Finish ignored, session is {}.", self.session.status.as_str());
        }
    }

    fn listen(&mut self) {
        if self.session.status != SessionStatus::Running
            || self.speaking.is_some()
            || self.in_flight.is_some()
        {
            tracing::debug!("Not arming speech input while the interviewer has the floor.");
            return;
        }
        if self.input_unavailable {
            return;
        }
        match self.input.start() {
            Ok(()) => tracing::debug!("Listening for the next answer."),
            Err(e @ SpeechError::Unavailable(_)) => {
                // Typed answers still work, so keep going without a microphone.
                self.input_unavailable = true;
                tracing::warn!("{e}. Continuing without voice input.");
                if self.session.last_error.is_none() {
                    self.session.last_error = Some(e.to_string());
                }
            }
            Err(e) => self.record_error(e.into()),
        }
    }

    fn utterance_ready(&mut self, text: String) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.session.status != SessionStatus::Running {
            tracing::debug!(
                "Dropping utterance, session is {}.",
                self.session.status.as_str()
            );
            return;
        }

        tracing::info!("Candidate said: \"{}\"", text);
        self.session.last_utterance = text.to_string();

        if self.in_flight.is_some() || self.speaking.is_some() {
            tracing::debug!("Interviewer is busy, queueing the answer.");
            self.queued.push_back(text.to_string());
        } else {
            self.take_turn(text.to_string());
        }
    }

    fn speech_finished(&mut self, id: UtteranceId) {
        if self.speaking != Some(id) {
            tracing::debug!("Ignoring finished notification for stale utterance {id}.");
            return;
        }
        self.speaking = None;
        if self.session.status == SessionStatus::Running {
            self.resume_turn_taking();
        }
    }

    /// Hands the floor back to the candidate: answers queued while the
    /// interviewer was busy go first, otherwise speech input is re-armed.
    fn resume_turn_taking(&mut self) {
        if self.in_flight.is_some() || self.speaking.is_some() {
            return;
        }
        match self.queued.pop_front() {
            Some(next) => self.take_turn(next),
            None => self.listen(),
        }
    }

    fn take_turn(&mut self, answer: String) {
        self.input.stop();
        self.session.transcript.append(Turn::user(answer));
        self.dispatch(ExchangeKind::Conversation);
    }

    fn tick(&mut self, now: Instant) {
        if self.session.status != SessionStatus::Running {
            return;
        }
        let Some(deadline) = self.deadline else {
            return;
        };
        self.session.remaining = deadline.saturating_duration_since(now);
        if self.session.remaining.is_zero() {
            tracing::info!("Time is up.");
            self.begin_evaluation();
        }
    }

    fn begin_evaluation(&mut self) {
        self.session.status = SessionStatus::Evaluating;
        self.silence();
        if !self.queued.is_empty() {
            tracing::debug!("Dropping {} unanswered utterance(s).", self.queued.len());
            self.queued.clear();
        }

        match &self.in_flight {
            // The evaluation goes out once the outstanding exchange resolves.
            Some(flight) => tracing::info!(
                "Waiting for exchange #{} before requesting the evaluation.",
                flight.ticket
            ),
            None => self.request_evaluation(),
        }
    }

    fn request_evaluation(&mut self) {
        if self.evaluation_requested {
            return;
        }
        self.evaluation_requested = true;
        let transcript = &mut self.session.transcript;
        transcript.append(Turn::system(self.config.evaluation_rubric.clone()));
        transcript.append(Turn::user(self.config.evaluation_request.clone()));
        tracing::info!("Requesting the final evaluation.");
        self.dispatch(ExchangeKind::Evaluation);
    }

    fn dispatch(&mut self, kind: ExchangeKind) {
        if let Some(previous) = self.in_flight.take() {
            tracing::warn!("Exchange #{} was still in flight, aborting it.", previous.ticket);
            previous.handle.abort();
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let history = self.session.transcript.turns().to_vec();
        let evaluate = kind == ExchangeKind::Evaluation;
        let dialogue = Arc::clone(&self.dialogue);
        let completions = self.completions_tx.clone();

        tracing::debug!(ticket, evaluate, turns = history.len(), "Dispatching exchange.");
        let handle = tokio::spawn(async move {
            let result = dialogue.exchange(&history, evaluate).await;
            // The controller may be gone already during shutdown.
            let _ = completions.send(ExchangeCompletion { ticket, result });
        });

        self.in_flight = Some(InFlight {
            ticket,
            kind,
            handle,
        });
    }

    fn on_completion(&mut self, completion: ExchangeCompletion) {
        let kind = match &self.in_flight {
            Some(flight) if flight.ticket == completion.ticket => flight.kind,
            _ => {
                tracing::debug!("Discarding stale result of exchange #{}.", completion.ticket);
                return;
            }
        };
        self.in_flight = None;

        match (kind, self.session.status) {
            (ExchangeKind::Conversation, SessionStatus::Running) => match completion.result {
                Ok(reply) => {
                    tracing::info!("Interviewer said: \"{}\"", reply);
                    self.session.transcript.append(Turn::assistant(reply.clone()));
                    self.input.stop();
                    self.speaking = Some(self.output.speak(&reply));
                }
                Err(e) => {
                    self.record_error(InterviewError::Backend(e));
                    self.resume_turn_taking();
                }
            },
            (ExchangeKind::Conversation, SessionStatus::Evaluating) => {
                // Arrived after the cutover: keep it in the log, never speak it.
                match completion.result {
                    Ok(reply) => self.session.transcript.append(Turn::assistant(reply)),
                    Err(e) => tracing::warn!("Exchange failed after time ran out: {e}"),
                }
                self.request_evaluation();
            }
            (ExchangeKind::Evaluation, SessionStatus::Evaluating) => {
                match completion.result {
                    Ok(evaluation) => {
                        tracing::info!("Evaluation received.");
                        self.session.evaluation = Some(evaluation);
                    }
                    Err(e) => self.record_error(InterviewError::Evaluation(e)),
                }
                self.session.status = SessionStatus::Finished;
                self.deadline = None;
                tracing::info!("Interview finished.");
            }
            (kind, status) => {
                tracing::debug!("Ignoring {:?} result while {}.", kind, status.as_str());
            }
        }
    }

    fn shutdown(&mut self) {
        self.silence();
        if let Some(flight) = self.in_flight.take() {
            flight.handle.abort();
        }
        self.queued.clear();
    }

    fn silence(&mut self) {
        self.input.stop();
        self.output.cancel();
        self.speaking = None;
    }

    fn record_error(&mut self, err: InterviewError) {
        tracing::warn!("{err}");
        self.session.last_error = Some(err.to_string());
    }

    fn publish(&mut self) {
        self.session.recognizing = self.input.is_recognizing();
        self.session.speaking = self.output.is_speaking();
        let snapshot = &self.session;
        self.observers.send_if_modified(|current| {
            if current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
    }
}
