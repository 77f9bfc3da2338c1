//! On-disk transcript cache keyed by video ID.

use crate::error::{Result, TubechatError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A cached transcript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub video_id: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Directory of `<video_id>.txt` transcripts.
#[derive(Debug, Clone)]
pub struct TranscriptCache {
    dir: PathBuf,
}

impl TranscriptCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a transcript for `video_id` is stored at.
    pub fn path_for(&self, video_id: &str) -> Result<PathBuf> {
        let valid = !video_id.is_empty()
            && video_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(TubechatError::InvalidInput(format!(
                "Invalid video ID: '{}'",
                video_id
            )));
        }
        Ok(self.dir.join(format!("{}.txt", video_id)))
    }

    /// Load a cached transcript, if present.
    pub fn load(&self, video_id: &str) -> Result<Option<String>> {
        let path = self.path_for(video_id)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Loaded transcript from {}", path.display());
                Ok(Some(text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a transcript, replacing any previous one.
    pub fn store(&self, video_id: &str, text: &str) -> Result<PathBuf> {
        let path = self.path_for(video_id)?;
        if text.trim().is_empty() {
            return Err(TubechatError::Transcript(
                "Refusing to store an empty transcript".to_string(),
            ));
        }
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, text)?;
        debug!("Stored transcript at {}", path.display());
        Ok(path)
    }

    /// List cached transcripts, sorted by video ID.
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(video_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            entries.push(CacheEntry {
                video_id: video_id.to_string(),
                bytes: entry.metadata()?.len(),
                path: path.clone(),
            });
        }

        entries.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(entries)
    }
}
