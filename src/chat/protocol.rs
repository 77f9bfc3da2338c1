//! Wire types for the `/api/chat` streaming protocol.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Request body for one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Build a request from a snapshot of the conversation.
    pub fn new(model: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            model: model.into(),
            messages: messages.to_vec(),
        }
    }
}

/// Optional timing and token counters reported by the server.
///
/// Durations are in nanoseconds. Servers usually send these only on the
/// final frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl Telemetry {
    /// Generation speed, when the server reported both counters.
    pub fn tokens_per_second(&self) -> Option<f64> {
        match (self.eval_count, self.eval_duration) {
            (Some(count), Some(duration)) if duration > 0 => {
                Some(count as f64 / (duration as f64 / 1_000_000_000.0))
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Telemetry::default()
    }
}

/// One decoded line of the response stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default)]
    pub done: bool,
    /// Set when the server aborts generation mid-stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub telemetry: Telemetry,
}

impl StreamFrame {
    /// Content carried by this frame, empty if none.
    pub fn fragment(&self) -> &str {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Error body returned with non-success status codes.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![Message::system("You are helpful."), Message::user("hello")];
        let request = ChatRequest::new("llama3", &messages);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "llama3",
                "messages": [
                    {"role": "system", "content": "You are helpful."},
                    {"role": "user", "content": "hello"}
                ]
            })
        );

        let decoded: ChatRequest = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_minimal_frame() {
        let frame: StreamFrame =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#)
                .unwrap();
        assert_eq!(frame.fragment(), "Hi");
        assert!(!frame.done);
        assert!(frame.telemetry.is_empty());
        assert_eq!(frame.message.unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_final_frame_keeps_telemetry() {
        let line = r#"{"model":"llama3","created_at":"2024-05-01T10:00:00.123Z","message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","total_duration":5000000000,"load_duration":1000,"prompt_eval_count":26,"prompt_eval_duration":2000,"eval_count":100,"eval_duration":2000000000}"#;
        let frame: StreamFrame = serde_json::from_str(line).unwrap();

        assert!(frame.done);
        assert_eq!(frame.model, "llama3");
        assert_eq!(frame.telemetry.done_reason.as_deref(), Some("stop"));
        assert_eq!(frame.telemetry.eval_count, Some(100));
        assert_eq!(frame.telemetry.tokens_per_second(), Some(50.0));

        let reencoded = serde_json::to_string(&frame).unwrap();
        let again: StreamFrame = serde_json::from_str(&reencoded).unwrap();
        assert_eq!(again, frame);
    }

    #[test]
    fn test_error_frame() {
        let frame: StreamFrame = serde_json::from_str(r#"{"error":"model crashed"}"#).unwrap();
        assert_eq!(frame.error.as_deref(), Some("model crashed"));
        assert_eq!(frame.fragment(), "");
        assert!(!frame.done);
    }

    #[test]
    fn test_tokens_per_second_needs_duration() {
        let telemetry = Telemetry {
            eval_count: Some(10),
            eval_duration: Some(0),
            ..Default::default()
        };
        assert_eq!(telemetry.tokens_per_second(), None);
    }
}
