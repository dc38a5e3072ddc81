use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use interview_core::{
    HttpDialogueClient, Session, SessionConfig, SessionController, SessionEvent, SpeechInput,
};
use interview_service::config::{Config, VoiceInput};
use interview_service::console::{
    ConsoleCommand, ConsoleView, HELP, parse_line, render_transcript,
};
use interview_service::evaluate::{BatchEvaluator, transcript_text};
use interview_service::prompt_loader;
use interview_service::speech::{
    ConsoleSpeechOutput, ConsoleTranscriber, UnavailableSpeechInput, console_input,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "A timed mock interview with an AI interviewer")]
struct Cli {
    /// Override INTERVIEW_API_BASE.
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Override INTERVIEW_DURATION_SECS.
    #[arg(long, global = true)]
    duration_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive interview session (default).
    Run,
    /// Evaluate a saved transcript (JSON array of turns or plain text).
    Evaluate { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration and CLI overrides ---
    let mut config = Config::from_env().context("Failed to load application configuration")?;
    let cli = Cli::parse();
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base.trim_end_matches('/').to_string();
    }
    if let Some(secs) = cli.duration_secs.filter(|s| *s > 0) {
        config.session_duration = Duration::from_secs(secs);
    }

    // --- 2. Initialize Logging ---
    // Logs go to stderr so they do not interleave with the conversation.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Backend: {}", config.api_base);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_session(config).await,
        Command::Evaluate { file } => evaluate_file(&config, &file).await,
    }
}

async fn run_session(config: Config) -> Result<()> {
    // --- Prompts ---
    let mut session_config = SessionConfig::default().with_duration(config.session_duration);
    if config.prompts_dir.is_dir() {
        let prompts = prompt_loader::load_prompts(&config.prompts_dir)
            .context("Failed to load interview prompts")?;
        tracing::info!("Loaded {} prompts successfully.", prompts.len());
        session_config = prompt_loader::apply_prompts(session_config, &prompts);
    } else {
        tracing::warn!(
            "Prompts directory {} not found, using built-in prompts.",
            config.prompts_dir.display()
        );
    }

    // --- Backend client ---
    let dialogue = Arc::new(
        HttpDialogueClient::new(config.interview_endpoint(), config.request_timeout)
            .context("Failed to build the dialogue client")?,
    );

    // --- Speech adapters ---
    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>(64);
    let output = ConsoleSpeechOutput::new(events_tx.clone(), config.words_per_minute);
    let (input, transcriber): (Box<dyn SpeechInput>, Option<ConsoleTranscriber>) =
        match config.voice_input {
            VoiceInput::Console => {
                let (input, transcriber) = console_input();
                (Box::new(input) as Box<dyn SpeechInput>, Some(transcriber))
            }
            VoiceInput::Off => (
                Box::new(UnavailableSpeechInput::new("voice input is turned off"))
                    as Box<dyn SpeechInput>,
                None,
            ),
        };

    let controller = SessionController::new(session_config, dialogue, input, output);
    let view_rx = controller.subscribe();

    println!("{HELP}\n");

    // Blocking stdin reads live on their own thread so they never hold up
    // runtime shutdown.
    {
        let events = events_tx.clone();
        let view = view_rx.clone();
        std::thread::spawn(move || read_console(events, transcriber, view));
    }
    let view_task = tokio::spawn(render_view(view_rx));
    let mut controller_task = tokio::spawn(controller.run(events_rx));

    tokio::select! {
        result = &mut controller_task => {
            result.context("Session controller task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            if events_tx.send(SessionEvent::Shutdown).await.is_ok() {
                controller_task.await.context("Session controller task failed")?;
            }
        }
    }

    view_task.abort();
    tracing::info!("Shutting down...");
    Ok(())
}

async fn render_view(mut view_rx: watch::Receiver<Session>) {
    let mut view = ConsoleView::new();
    while view_rx.changed().await.is_ok() {
        let lines = view.render(&view_rx.borrow_and_update());
        for line in lines {
            println!("{line}");
        }
    }
}

fn read_console(
    events: mpsc::Sender<SessionEvent>,
    transcriber: Option<ConsoleTranscriber>,
    view: watch::Receiver<Session>,
) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read from stdin: {}", e);
                break;
            }
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };

        let event = match command {
            ConsoleCommand::Start => SessionEvent::Start,
            ConsoleCommand::Restart => SessionEvent::Restart,
            ConsoleCommand::Finish => SessionEvent::Finish,
            ConsoleCommand::Listen => SessionEvent::Listen,
            ConsoleCommand::Quit => break,
            ConsoleCommand::Transcript => {
                println!("{}", render_transcript(&view.borrow()));
                continue;
            }
            ConsoleCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ConsoleCommand::Unknown(command) => {
                println!("Unknown command {command}, try /help");
                continue;
            }
            ConsoleCommand::Answer(text) => match &transcriber {
                Some(transcriber) => match transcriber.transcribe(&text) {
                    Some(event) => event,
                    None => {
                        println!("(not listening, wait for the interviewer or use /listen)");
                        continue;
                    }
                },
                None => SessionEvent::UtteranceReady(text),
            },
        };

        if events.blocking_send(event).is_err() {
            return;
        }
    }

    let _ = events.blocking_send(SessionEvent::Shutdown);
}

async fn evaluate_file(config: &Config, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read transcript: {}", file.display()))?;
    let transcript = transcript_text(&raw);
    if transcript.is_empty() {
        bail!("Transcript {} is empty", file.display());
    }

    let evaluator = BatchEvaluator::new(config.evaluate_endpoint(), config.request_timeout)
        .context("Failed to build the evaluation client")?;
    let evaluation = evaluator
        .evaluate(&transcript)
        .await
        .context("Evaluation request failed")?;

    println!("{evaluation}");
    Ok(())
}
