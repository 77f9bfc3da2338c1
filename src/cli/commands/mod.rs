//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod transcript;

pub use chat::{
    chat_loop, classify_input, run_chat, stream_reply, LoopOptions, PromptInput, EXIT_COMMAND,
};
pub use config::run_config;
pub use doctor::run_doctor;
pub use transcript::run_transcript;
