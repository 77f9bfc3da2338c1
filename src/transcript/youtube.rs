//! YouTube video ID extraction.

use crate::error::{Result, TubechatError};
use regex::Regex;

/// Parses YouTube URLs and bare video IDs.
pub struct VideoIdParser {
    video_id_regex: Regex,
}

impl VideoIdParser {
    pub fn new() -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:[^&\s]+&)*v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("video id pattern is valid");

        Self { video_id_regex }
    }

    /// Extract the video ID from a URL or bare ID.
    pub fn extract(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for VideoIdParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a video ID, failing with a readable error.
pub fn extract_video_id(input: &str) -> Result<String> {
    VideoIdParser::new().extract(input).ok_or_else(|| {
        TubechatError::InvalidInput(format!("No YouTube video ID found in '{}'", input.trim()))
    })
}
