//! Configuration module for Tubechat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::Prompts;
pub use settings::{ChatSettings, GeneralSettings, PromptSettings, Settings, TranscriptSettings};
