//! Tubechat - chat with a local LLM about a video
//!
//! A terminal chat client for Ollama-compatible inference servers. Replies
//! are streamed as newline-delimited JSON and printed as they arrive; the
//! whole conversation is resent on every turn. A conversation can be seeded
//! with a video transcript so the model answers questions about it.
//!
//! # Architecture
//!
//! - `chat` - Conversation, wire protocol, stream decoder and session
//! - `transcript` - Transcript sources and the on-disk transcript cache
//! - `config` - Settings and prompt templates
//! - `cli` - Command-line interface and the interactive loop
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::chat::{ChatSession, Conversation, Message, TurnEvent};
//! use tubechat::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let session = ChatSession::new(&settings.chat)?;
//!
//!     let mut conversation = Conversation::with_system("You are a helpful assistant.");
//!     conversation.append(Message::user("Why is the sky blue?"));
//!
//!     let mut turn = session.send(&mut conversation).await?;
//!     while let Some(event) = turn.next_event().await? {
//!         if let TurnEvent::Fragment(text) = event {
//!             print!("{}", text);
//!         }
//!     }
//!     let summary = turn.finish().await?;
//!     println!("\n({} fragments)", summary.fragments);
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod transcript;

pub use error::{Result, TubechatError};
