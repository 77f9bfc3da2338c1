//! Interactive chat command.

use crate::chat::{ChatSession, Conversation, Message, Telemetry, Turn, TurnEvent, TurnSummary};
use crate::cli::preflight::{self, Operation};
use crate::cli::{ChatArgs, Output};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::transcript::{
    seed_conversation, CachedTranscript, FileTranscript, TranscriptCache, TranscriptSource,
};
use console::style;
use indicatif::ProgressBar;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Input that ends the session.
pub const EXIT_COMMAND: &str = "/bye";

/// What a line of user input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Exit,
    Blank,
    Message(String),
}

/// Classify one line of input. Surrounding whitespace is ignored.
pub fn classify_input(line: &str) -> PromptInput {
    let line = line.trim();
    if line == EXIT_COMMAND {
        PromptInput::Exit
    } else if line.is_empty() {
        PromptInput::Blank
    } else {
        PromptInput::Message(line.to_string())
    }
}

/// Display options for the terminal loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopOptions {
    /// Show a spinner until the first fragment arrives.
    pub show_spinner: bool,
    /// Print generation stats after each reply.
    pub show_stats: bool,
}

/// Run the interactive chat command.
pub async fn run_chat(args: &ChatArgs, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(model) = &args.model {
        settings.chat.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        settings.chat.endpoint = endpoint.clone();
    }

    let seeded = args.video.is_some() || args.transcript.is_some();
    let operation = if seeded {
        Operation::SeededChat
    } else {
        Operation::Chat
    };
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubechat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    if let Some(system) = &args.system {
        prompts.system = system.clone();
        prompts.transcript_system = format!("{}\nHere is the transcript: {{{{transcript}}}}", system);
    }

    let source: Option<Box<dyn TranscriptSource>> = match (&args.video, &args.transcript) {
        (Some(video), _) => Some(Box::new(CachedTranscript::for_video(
            TranscriptCache::new(settings.transcript_dir()),
            video,
        )?)),
        (None, Some(path)) => Some(Box::new(FileTranscript::new(Settings::expand_path(path)))),
        (None, None) => None,
    };

    if let Some(source) = &source {
        Output::info(&format!("Loading {}", source.describe()));
    }
    let mut conversation = seed_conversation(&prompts, source.as_deref()).await?;

    let session = ChatSession::new(&settings.chat)?;
    info!("Chat session started with {} at {}", session.model(), session.endpoint());

    let options = LoopOptions {
        show_spinner: Output::spinner_visible(),
        show_stats: args.stats || settings.chat.show_stats,
    };

    println!("\n{}", style("Tubechat").bold().cyan());
    println!(
        "{}\n",
        style(format!(
            "Model: {}. Type your message, or '{}' to quit.",
            session.model(),
            EXIT_COMMAND
        ))
        .dim()
    );

    let mut stdout = io::stdout();

    if seeded && settings.chat.synopsis_on_start && !args.no_synopsis {
        // The opening turn carries only the system message
        if let Err(e) = stream_reply(&session, &mut conversation, &mut stdout, &options).await {
            if e.ends_session() {
                return Err(e.into());
            }
            Output::error(&format!("{}", e));
        }
    }

    let stdin = io::stdin();
    chat_loop(&session, &mut conversation, stdin.lock(), &mut stdout, &options).await?;

    debug!("Session ended after {} messages", conversation.len());
    Output::info("Goodbye!");
    Ok(())
}

/// Read prompts until the exit command or end of input.
///
/// Each prompt is appended to the conversation and answered with a streamed
/// reply. Errors that only affect one turn are printed and the loop goes on.
pub async fn chat_loop<R: BufRead, W: Write>(
    session: &ChatSession,
    conversation: &mut Conversation,
    mut input: R,
    out: &mut W,
    options: &LoopOptions,
) -> Result<()> {
    loop {
        write!(out, "{} ", style(">").green().bold())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match classify_input(&line) {
            PromptInput::Exit => break,
            PromptInput::Blank => continue,
            PromptInput::Message(text) => {
                conversation.append(Message::user(text));
                match stream_reply(session, conversation, out, options).await {
                    Ok(_) => {}
                    Err(e) if e.ends_session() => return Err(e),
                    Err(e) => Output::error(&format!("{}", e)),
                }
            }
        }
    }

    Ok(())
}

/// Send the conversation and print the reply as it streams in.
pub async fn stream_reply<W: Write>(
    session: &ChatSession,
    conversation: &mut Conversation,
    out: &mut W,
    options: &LoopOptions,
) -> Result<TurnSummary> {
    let spinner = Output::spinner("Thinking...", options.show_spinner);

    let result = match session.send(conversation).await {
        Ok(turn) => print_turn(turn, out, &spinner).await,
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();
    let summary = result?;

    if options.show_stats {
        if let Some(stats) = summary.telemetry.as_ref().and_then(format_stats) {
            writeln!(out, "{}", style(stats).dim())?;
        }
    }

    Ok(summary)
}

async fn print_turn<W: Write>(
    mut turn: Turn<'_>,
    out: &mut W,
    spinner: &ProgressBar,
) -> Result<TurnSummary> {
    let mut printed = false;

    loop {
        let event = match turn.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(e) => {
                if printed {
                    writeln!(out)?;
                }
                return Err(e);
            }
        };

        match event {
            TurnEvent::Fragment(text) => {
                if !printed {
                    spinner.finish_and_clear();
                    printed = true;
                }
                write!(out, "{}", text)?;
                out.flush()?;
            }
            TurnEvent::Malformed(e) => {
                spinner.suspend(|| Output::warning(&format!("Skipped: {}", e)));
            }
        }
    }

    let summary = turn.finish().await?;
    writeln!(out)?;
    Ok(summary)
}

/// One-line summary of generation counters.
fn format_stats(telemetry: &Telemetry) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(count) = telemetry.eval_count {
        parts.push(format!("{} tokens", count));
    }
    if let Some(rate) = telemetry.tokens_per_second() {
        parts.push(format!("{:.1} tokens/s", rate));
    }
    if let Some(total) = telemetry.total_duration {
        parts.push(format!("{:.1}s total", total as f64 / 1_000_000_000.0));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
