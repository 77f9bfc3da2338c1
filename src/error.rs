//! Error types for Tubechat.

use thiserror::Error;

/// Library-level error type for Tubechat operations.
#[derive(Error, Debug)]
pub enum TubechatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Malformed stream frame at line {line}: {reason}")]
    FrameDecode { line: usize, reason: String },

    #[error("Turn aborted before the reply completed")]
    TurnAborted,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TubechatError {
    /// A single bad line in the response stream; the turn keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TubechatError::FrameDecode { .. })
    }

    /// Errors after which the interactive session cannot sensibly continue.
    ///
    /// Everything else is fatal to the current turn only.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            TubechatError::Internal(_) | TubechatError::Io(_) | TubechatError::Json(_)
        )
    }
}

/// Result type alias for Tubechat operations.
pub type Result<T> = std::result::Result<T, TubechatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let decode = TubechatError::FrameDecode {
            line: 3,
            reason: "expected value".to_string(),
        };
        assert!(decode.is_recoverable());
        assert!(!decode.ends_session());

        let transport = TubechatError::Transport("connection refused".to_string());
        assert!(!transport.is_recoverable());
        assert!(!transport.ends_session());

        assert!(TubechatError::Internal("boom".to_string()).ends_session());
    }

    #[test]
    fn test_frame_decode_message_names_line() {
        let err = TubechatError::FrameDecode {
            line: 7,
            reason: "EOF while parsing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed stream frame at line 7: EOF while parsing"
        );
    }
}
