//! CLI module for Tubechat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_size, Output};

use clap::{Args, Parser, Subcommand};

/// Tubechat - chat with a local LLM about a video
///
/// Streams replies from an Ollama-compatible server, optionally seeding the
/// conversation with a video transcript.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Manage cached transcripts
    Transcript {
        #[command(subcommand)]
        action: TranscriptAction,
    },

    /// Check the inference server and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ChatArgs {
    /// Model to use (overrides config)
    #[arg(short, long, env = "TUBECHAT_MODEL")]
    pub model: Option<String>,

    /// Chat endpoint URL (overrides config)
    #[arg(short, long, env = "TUBECHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// YouTube URL or video ID whose cached transcript seeds the chat
    #[arg(long, conflicts_with = "transcript")]
    pub video: Option<String>,

    /// Transcript file that seeds the chat
    #[arg(short, long)]
    pub transcript: Option<String>,

    /// System prompt (overrides the configured prompt)
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print generation stats after each reply
    #[arg(long)]
    pub stats: bool,

    /// Skip the opening synopsis when a transcript is loaded
    #[arg(long)]
    pub no_synopsis: bool,
}

#[derive(Subcommand, Debug)]
pub enum TranscriptAction {
    /// Import a transcript file for a video
    Import {
        /// YouTube URL or video ID
        video: String,
        /// Transcript text file
        file: String,
    },

    /// List cached transcripts
    List,

    /// Print a cached transcript
    Show {
        /// YouTube URL or video ID
        video: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
