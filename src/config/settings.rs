//! Configuration settings for Tubechat.

use crate::error::{Result, TubechatError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chat: ChatSettings,
    pub transcript: TranscriptSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubechat".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Inference server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Full URL of the streaming chat endpoint.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Seconds to wait for a connection.
    pub connect_timeout_secs: u64,
    /// Overall request deadline, including the streamed body. None = no limit.
    pub request_timeout_secs: Option<u64>,
    /// Ask for a synopsis before the first prompt when a transcript is loaded.
    pub synopsis_on_start: bool,
    /// Print generation stats after each reply.
    pub show_stats: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/chat".to_string(),
            model: "llama3".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            synopsis_on_start: true,
            show_stats: false,
        }
    }
}

impl ChatSettings {
    /// Check the endpoint and model before starting a session.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint).map_err(|e| {
            TubechatError::Config(format!("Invalid chat endpoint '{}': {}", self.endpoint, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TubechatError::Config(format!(
                "Chat endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(TubechatError::Config("Model name is empty".to_string()));
        }

        Ok(())
    }

    /// Base URL of the server hosting the chat endpoint.
    pub fn server_root(&self) -> Result<url::Url> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| TubechatError::Config(format!("Invalid chat endpoint: {}", e)))?;
        url.join("/")
            .map_err(|e| TubechatError::Config(format!("Invalid chat endpoint: {}", e)))
    }
}

/// Transcript cache and collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Directory holding `<video_id>.txt` transcripts.
    pub cache_dir: String,
    /// Environment variable holding the transcription service API key.
    pub api_key_env: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            cache_dir: "~/.tubechat/transcripts".to_string(),
            api_key_env: "AA_KEY".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubechatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubechat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded transcript cache path.
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.transcript.cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.chat.validate().is_ok());
        assert_eq!(settings.chat.model, "llama3");
        assert_eq!(settings.transcript.api_key_env, "AA_KEY");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut chat = ChatSettings::default();
        chat.endpoint = "localhost:11434/api/chat".to_string();
        assert!(chat.validate().is_err());

        chat.endpoint = "ftp://localhost/api/chat".to_string();
        assert!(chat.validate().is_err());

        chat.endpoint = "http://localhost:11434/api/chat".to_string();
        chat.model = "  ".to_string();
        assert!(chat.validate().is_err());
    }

    #[test]
    fn test_server_root() {
        let chat = ChatSettings::default();
        assert_eq!(
            chat.server_root().unwrap().as_str(),
            "http://localhost:11434/"
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nmodel = \"mistral\"\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.chat.model, "mistral");
        assert_eq!(settings.chat.endpoint, "http://localhost:11434/api/chat");
        assert!(settings.chat.synopsis_on_start);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.chat.show_stats = true;
        settings.chat.request_timeout_secs = Some(600);
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(loaded.chat.show_stats);
        assert_eq!(loaded.chat.request_timeout_secs, Some(600));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.general.data_dir, "~/.tubechat");
    }
}
