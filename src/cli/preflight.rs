//! Pre-flight checks before starting a session.
//!
//! Validates configuration up front so a bad endpoint or missing transcript
//! is reported before the user starts typing.

use crate::config::Settings;
use crate::error::{Result, TubechatError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting requires a valid endpoint and model.
    Chat,
    /// Seeded chat additionally needs a readable transcript cache.
    SeededChat,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    settings.chat.validate()?;

    if let Operation::SeededChat = operation {
        check_transcript_dir(settings)?;
    }

    Ok(())
}

/// The transcript cache may be missing, but must not be a file.
fn check_transcript_dir(settings: &Settings) -> Result<()> {
    let dir = settings.transcript_dir();
    if dir.exists() && !dir.is_dir() {
        return Err(TubechatError::Config(format!(
            "Transcript cache {} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Whether the transcription collaborator's API key is present.
pub fn collaborator_key_present(settings: &Settings) -> bool {
    std::env::var(&settings.transcript.api_key_env)
        .map(|key| !key.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_default_settings() {
        assert!(check(Operation::Chat, &Settings::default()).is_ok());
    }

    #[test]
    fn test_check_rejects_invalid_endpoint() {
        let mut settings = Settings::default();
        settings.chat.endpoint = "not a url".to_string();
        assert!(check(Operation::Chat, &settings).is_err());
    }

    #[test]
    fn test_transcript_dir_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("transcripts");
        std::fs::write(&file, "").unwrap();

        let mut settings = Settings::default();
        settings.transcript.cache_dir = file.display().to_string();
        assert!(check(Operation::SeededChat, &settings).is_err());
        assert!(check(Operation::Chat, &settings).is_ok());
    }

    #[test]
    fn test_collaborator_key_missing() {
        let mut settings = Settings::default();
        settings.transcript.api_key_env = "TUBECHAT_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(!collaborator_key_present(&settings));
    }
}
