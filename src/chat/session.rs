//! Chat session controller.
//!
//! A [`ChatSession`] sends the whole conversation with every request and
//! hands back a [`Turn`]. The response body is decoded on a spawned task
//! that feeds a channel of capacity one, so the decoder runs ahead of the
//! caller by at most one frame and never drops any.

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::client::create_client;
use super::decoder::decode_frames;
use super::message::{Conversation, Message};
use super::protocol::{ChatRequest, ErrorBody, StreamFrame, Telemetry};
use crate::config::ChatSettings;
use crate::error::{Result, TubechatError};

/// Frames buffered between the decoder task and the consumer.
const FRAME_CHANNEL_CAPACITY: usize = 1;

/// Client for one conversation with an inference server.
pub struct ChatSession {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ChatSession {
    /// Create a session from settings.
    pub fn new(settings: &ChatSettings) -> Result<Self> {
        let http = create_client(settings)?;
        Ok(Self::with_client(http, &settings.endpoint, &settings.model))
    }

    /// Create a session with an existing HTTP client.
    pub fn with_client(http: reqwest::Client, endpoint: &str, model: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the conversation and open the reply stream.
    ///
    /// Fails without touching the conversation if the request cannot be
    /// delivered or the server rejects it. On success the returned [`Turn`]
    /// appends the assistant reply when finished.
    #[instrument(skip_all, fields(model = %self.model, messages = conversation.len()))]
    pub async fn send<'c>(&self, conversation: &'c mut Conversation) -> Result<Turn<'c>> {
        let request = ChatRequest::new(&self.model, conversation.snapshot());
        let body = serde_json::to_vec(&request)
            .map_err(|e| TubechatError::Internal(format!("Failed to encode request: {}", e)))?;

        debug!("POST {} ({} bytes)", self.endpoint, body.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TubechatError::Transport(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(TubechatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| TubechatError::Transport(format!("Reading response failed: {}", e)))
        });

        Ok(Turn::start(conversation, Box::pin(bytes)))
    }
}

/// Something the caller should see while a reply streams in.
#[derive(Debug)]
pub enum TurnEvent {
    /// A piece of reply text, in stream order.
    Fragment(String),
    /// A line that could not be decoded. The turn continues.
    Malformed(TubechatError),
}

/// Outcome of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSummary {
    /// Full reply as appended to the conversation.
    pub reply: String,
    pub fragments: usize,
    pub malformed_lines: usize,
    /// Counters from the final frame, if the server sent one.
    pub telemetry: Option<Telemetry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Streaming,
    Complete,
    Aborted,
}

/// An in-flight reply.
///
/// Pull events with [`Turn::next_event`], then call [`Turn::finish`] to
/// record the reply. Dropping an unfinished turn abandons the connection and
/// leaves the conversation as it was.
pub struct Turn<'c> {
    conversation: &'c mut Conversation,
    frames: mpsc::Receiver<Result<StreamFrame>>,
    producer: JoinHandle<()>,
    state: TurnState,
    reply: String,
    fragments: usize,
    malformed_lines: usize,
    telemetry: Option<Telemetry>,
}

impl<'c> Turn<'c> {
    /// Start decoding `bytes` on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S, B>(conversation: &'c mut Conversation, bytes: S) -> Self
    where
        S: futures::Stream<Item = Result<B>> + Unpin + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        let producer = tokio::spawn(async move {
            let mut frames = Box::pin(decode_frames(bytes));
            while let Some(item) = frames.next().await {
                if tx.send(item).await.is_err() {
                    debug!("Turn dropped; abandoning response stream");
                    break;
                }
            }
        });

        Self {
            conversation,
            frames: rx,
            producer,
            state: TurnState::Streaming,
            reply: String::new(),
            fragments: 0,
            malformed_lines: 0,
            telemetry: None,
        }
    }

    /// Wait for the next event.
    ///
    /// Returns `Ok(None)` once the stream has ended. A returned error is
    /// fatal to the turn: later calls return `Ok(None)` and
    /// [`Turn::finish`] fails.
    pub async fn next_event(&mut self) -> Result<Option<TurnEvent>> {
        loop {
            if self.state != TurnState::Streaming {
                return Ok(None);
            }

            let frame = match self.frames.recv().await {
                None => {
                    self.state = TurnState::Complete;
                    return Ok(None);
                }
                Some(Ok(frame)) => frame,
                Some(Err(e)) if e.is_recoverable() => {
                    self.malformed_lines += 1;
                    warn!("{}", e);
                    return Ok(Some(TurnEvent::Malformed(e)));
                }
                Some(Err(e)) => {
                    self.state = TurnState::Aborted;
                    return Err(e);
                }
            };

            if let Some(message) = &frame.error {
                self.state = TurnState::Aborted;
                return Err(TubechatError::Server(message.clone()));
            }

            if frame.done {
                if let Some(rate) = frame.telemetry.tokens_per_second() {
                    debug!("Generation finished at {:.1} tokens/s", rate);
                }
                self.telemetry = Some(frame.telemetry.clone());
            }

            let fragment = frame.fragment();
            if fragment.is_empty() {
                continue;
            }

            self.reply.push_str(fragment);
            self.fragments += 1;
            return Ok(Some(TurnEvent::Fragment(fragment.to_string())));
        }
    }

    /// Drain the stream and append the assistant reply.
    ///
    /// Anything the caller did not read is consumed first. An empty stream
    /// still appends an assistant message with empty content.
    pub async fn finish(mut self) -> Result<TurnSummary> {
        while self.next_event().await?.is_some() {}

        if self.state == TurnState::Aborted {
            return Err(TubechatError::TurnAborted);
        }

        let reply = std::mem::take(&mut self.reply);
        self.conversation.append(Message::assistant(reply.clone()));
        debug!(
            "Turn complete: {} fragments, {} chars",
            self.fragments,
            reply.len()
        );

        Ok(TurnSummary {
            reply,
            fragments: self.fragments,
            malformed_lines: self.malformed_lines,
            telemetry: self.telemetry.take(),
        })
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.producer.abort();
    }
}
