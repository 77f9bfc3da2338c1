//! Streaming chat client for Ollama-compatible `/api/chat` endpoints.
//!
//! - `message` - Roles, messages and the append-only conversation
//! - `protocol` - Request and stream frame wire types
//! - `decoder` - Line-delimited JSON stream decoding
//! - `session` - Request dispatch and reply assembly

mod client;
mod decoder;
mod message;
mod protocol;
mod session;

pub use client::create_client;
pub use decoder::decode_frames;
pub use message::{Conversation, Message, Role};
pub use protocol::{ChatRequest, StreamFrame, Telemetry};
pub use session::{ChatSession, Turn, TurnEvent, TurnSummary};
