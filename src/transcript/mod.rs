//! Transcript sources for seeding a conversation.
//!
//! Downloading and transcribing video happens outside Tubechat. This module
//! only reads transcripts that already exist, either from a file the user
//! points at or from the transcript cache, and turns them into the opening
//! system message.

mod cache;
mod youtube;

pub use cache::{CacheEntry, TranscriptCache};
pub use youtube::{extract_video_id, VideoIdParser};

use crate::chat::Conversation;
use crate::config::Prompts;
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Something that can produce a transcript.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Human-readable description for status output.
    fn describe(&self) -> String;

    /// Fetch the transcript text.
    async fn fetch(&self) -> Result<String>;
}

/// A transcript stored in a plain text file.
pub struct FileTranscript {
    path: PathBuf,
}

impl FileTranscript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TranscriptSource for FileTranscript {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TubechatError::Transcript(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if text.trim().is_empty() {
            return Err(TubechatError::Transcript(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(text)
    }
}

/// A transcript previously imported into the cache for a video.
pub struct CachedTranscript {
    cache: TranscriptCache,
    video_id: String,
}

impl CachedTranscript {
    /// Resolve a YouTube URL or ID against the cache.
    pub fn for_video(cache: TranscriptCache, input: &str) -> Result<Self> {
        let video_id = extract_video_id(input)?;
        Ok(Self { cache, video_id })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

#[async_trait]
impl TranscriptSource for CachedTranscript {
    fn describe(&self) -> String {
        format!("cached transcript for {}", self.video_id)
    }

    async fn fetch(&self) -> Result<String> {
        self.cache.load(&self.video_id)?.ok_or_else(|| {
            TubechatError::TranscriptNotFound(format!(
                "{} (import one with 'tubechat transcript import {} <file>')",
                self.video_id, self.video_id
            ))
        })
    }
}

/// Build the opening conversation, with an optional transcript.
pub async fn seed_conversation(
    prompts: &Prompts,
    source: Option<&dyn TranscriptSource>,
) -> Result<Conversation> {
    let transcript = match source {
        Some(source) => {
            let text = source.fetch().await?;
            info!("Seeding conversation from {} ({} chars)", source.describe(), text.len());
            Some(text)
        }
        None => None,
    };

    Ok(Conversation::with_system(
        prompts.system_prompt(transcript.as_deref()),
    ))
}
