//! Transcript cache commands.

use crate::cli::{format_size, Output, TranscriptAction};
use crate::config::Settings;
use crate::transcript::{extract_video_id, TranscriptCache};
use anyhow::Context;

/// Run a transcript subcommand.
pub fn run_transcript(action: &TranscriptAction, settings: &Settings) -> anyhow::Result<()> {
    let cache = TranscriptCache::new(settings.transcript_dir());

    match action {
        TranscriptAction::Import { video, file } => {
            let video_id = extract_video_id(video)?;
            let path = Settings::expand_path(file);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let stored = cache.store(&video_id, &text)?;
            Output::success(&format!(
                "Imported transcript for {} ({})",
                video_id,
                format_size(text.len() as u64)
            ));
            Output::kv("Path", &stored.display().to_string());
        }

        TranscriptAction::List => {
            let entries = cache.list()?;
            if entries.is_empty() {
                Output::info("No cached transcripts.");
                Output::info("Import one with: tubechat transcript import <video> <file>");
                return Ok(());
            }

            Output::header(&format!("Cached transcripts ({})", entries.len()));
            for entry in entries {
                Output::list_item(&format!(
                    "{} ({})",
                    entry.video_id,
                    format_size(entry.bytes)
                ));
            }
        }

        TranscriptAction::Show { video } => {
            let video_id = extract_video_id(video)?;
            match cache.load(&video_id)? {
                Some(text) => println!("{}", text.trim_end()),
                None => anyhow::bail!("No cached transcript for {}", video_id),
            }
        }
    }

    Ok(())
}
