use interview_core::{Session, SessionStatus};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Restart,
    Finish,
    Listen,
    Transcript,
    Quit,
    Help,
    /// Anything that is not a command.
    Answer(String),
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /start       begin the interview
  /restart     throw the current session away and start over
  /finish      end early and get the evaluation
  /listen      arm the microphone
  /transcript  show the conversation so far
  /quit        leave
Anything else is your answer.";

/// Parses one line of terminal input. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ConsoleCommand::Answer(line.to_string()));
    };

    let parsed = match command.to_lowercase().as_str() {
        "start" => ConsoleCommand::Start,
        "restart" => ConsoleCommand::Restart,
        "finish" | "end" => ConsoleCommand::Finish,
        "listen" | "mic" => ConsoleCommand::Listen,
        "transcript" => ConsoleCommand::Transcript,
        "quit" | "exit" => ConsoleCommand::Quit,
        "help" | "?" => ConsoleCommand::Help,
        _ => ConsoleCommand::Unknown(line.to_string()),
    };
    Some(parsed)
}

/// Formats a countdown as `m:ss`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// The visible part of the transcript, one line per turn.
pub fn render_transcript(session: &Session) -> String {
    let lines: Vec<String> = session
        .transcript
        .visible()
        .map(|turn| {
            let speaker = match turn.role {
                interview_core::Role::Assistant => "Interviewer",
                _ => "You",
            };
            format!("{speaker}: {}", turn.content)
        })
        .collect();
    if lines.is_empty() {
        "(no conversation yet)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Turns a stream of session snapshots into console output, printing only
/// what changed since the previous snapshot.
#[derive(Debug, Default)]
pub struct ConsoleView {
    status: SessionStatus,
    remaining_secs: Option<u64>,
    last_error: Option<String>,
    evaluation_shown: bool,
    recognizing: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, session: &Session) -> Vec<String> {
        let mut lines = Vec::new();

        if session.status != self.status {
            self.status = session.status;
            self.remaining_secs = Some(session.remaining.as_secs());
            match session.status {
                SessionStatus::Idle => {}
                SessionStatus::Running => {
                    self.evaluation_shown = false;
                    lines.push(format!(
                        "Interview started. You have {}.",
                        format_remaining(session.remaining)
                    ));
                }
                SessionStatus::Evaluating => {
                    lines.push("Time is up. Preparing your evaluation...".to_string())
                }
                SessionStatus::Finished => lines.push("Interview finished.".to_string()),
            }
        }

        if session.status == SessionStatus::Running {
            let secs = session.remaining.as_secs();
            let announce = secs % 60 == 0 || secs <= 10;
            if self.remaining_secs != Some(secs) && announce && secs > 0 {
                lines.push(format!("[{} left]", format_remaining(session.remaining)));
            }
            self.remaining_secs = Some(secs);
        }

        if session.recognizing && !self.recognizing {
            lines.push("(listening...)".to_string());
        }
        self.recognizing = session.recognizing;

        if session.last_error != self.last_error {
            if let Some(error) = &session.last_error {
                lines.push(format!("Error: {error}"));
            }
            self.last_error = session.last_error.clone();
        }

        if let Some(evaluation) = &session.evaluation {
            if !self.evaluation_shown {
                self.evaluation_shown = true;
                lines.push(format!("Final evaluation:\n{evaluation}"));
            }
        }

        lines
    }
}
