//! Newline-delimited JSON decoding for streamed chat responses.
//!
//! The server writes one complete JSON object per line. Transport chunks do
//! not respect line boundaries, so bytes are buffered until a newline is
//! seen before a line is handed to the JSON decoder.

use futures::stream::{self, Stream, StreamExt};
use tracing::trace;

use super::protocol::StreamFrame;
use crate::error::{Result, TubechatError};

struct DecoderState<S> {
    stream: S,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    line: usize,
    finished: bool,
}

/// Decode a byte stream into a stream of frames.
///
/// The output ends after the first frame with `done` set, or when the input
/// ends. A line that fails to decode is yielded as a
/// [`TubechatError::FrameDecode`] and decoding resumes at the next line. An
/// error from the input stream is yielded once and ends the output.
pub fn decode_frames<S, B>(byte_stream: S) -> impl Stream<Item = Result<StreamFrame>>
where
    S: Stream<Item = Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = DecoderState {
        stream: byte_stream,
        buffer: Vec::new(),
        scanned: 0,
        line: 0,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            let unscanned = &state.buffer[state.scanned..];
            if let Some(offset) = unscanned.iter().position(|b| *b == b'\n') {
                let pos = state.scanned + offset;
                let raw: Vec<u8> = state.buffer.drain(..=pos).collect();
                state.scanned = 0;
                state.line += 1;
                if let Some(item) = decode_line(&raw[..pos], state.line) {
                    if matches!(&item, Ok(frame) if frame.done) {
                        state.finished = true;
                    }
                    return Some((item, state));
                }
                continue;
            }
            state.scanned = state.buffer.len();

            match state.stream.next().await {
                Some(Ok(chunk)) => {
                    trace!("Received {} bytes", chunk.as_ref().len());
                    state.buffer.extend_from_slice(chunk.as_ref());
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    // A server may omit the newline after the last object
                    state.finished = true;
                    if state.buffer.is_empty() {
                        return None;
                    }
                    let raw = std::mem::take(&mut state.buffer);
                    state.line += 1;
                    return decode_line(&raw, state.line).map(|item| (item, state));
                }
            }
        }
    })
}

/// Decode one line. Blank lines yield nothing.
fn decode_line(raw: &[u8], line: usize) -> Option<Result<StreamFrame>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(TubechatError::FrameDecode {
                line,
                reason: format!("invalid UTF-8: {}", e),
            }))
        }
    };

    if text.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<StreamFrame>(text).map_err(|e| TubechatError::FrameDecode {
            line,
            reason: e.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>>> + Unpin {
        let owned: Vec<Result<Vec<u8>>> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    async fn collect(parts: &[&str]) -> Vec<Result<StreamFrame>> {
        decode_frames(chunks(parts)).collect().await
    }

    #[tokio::test]
    async fn test_decodes_one_frame_per_line() {
        let frames = collect(&[concat!(
            r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#,
            "\n",
            r#"{"message":{"role":"assistant","content":" there"},"done":true}"#,
            "\n"
        )])
        .await;

        let fragments: Vec<String> = frames
            .into_iter()
            .map(|f| f.unwrap().fragment().to_string())
            .collect();
        assert_eq!(fragments, vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_reassembles_line_split_across_chunks() {
        let frames = collect(&[
            r#"{"message":{"role":"assis"#,
            r#"tant","content":"Hel"#,
            "lo\"},\"done\":false}\n{\"done\":",
            "true}\n",
        ])
        .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().fragment(), "Hello");
        assert!(frames[1].as_ref().unwrap().done);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let line = "{\"message\":{\"role\":\"assistant\",\"content\":\"caf\u{e9}\"},\"done\":true}\n";
        let bytes = line.as_bytes();
        let split = line.find('\u{e9}').unwrap() + 1;
        let parts: Vec<Result<Vec<u8>>> =
            vec![Ok(bytes[..split].to_vec()), Ok(bytes[split..].to_vec())];

        let frames: Vec<_> = decode_frames(stream::iter(parts)).collect().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().fragment(), "caf\u{e9}");
    }

    #[tokio::test]
    async fn test_stops_after_done() {
        let frames = collect(&[
            "{\"done\":true}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"late\"},\"done\":false}\n",
        ])
        .await;
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_line_is_reported_and_skipped() {
        let frames = collect(&[concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"a\"},\"done\":false}\n",
            "not json\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"b\"},\"done\":true}\n"
        )])
        .await;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap().fragment(), "a");
        match &frames[1] {
            Err(TubechatError::FrameDecode { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected decode error, got {:?}", other),
        }
        assert_eq!(frames[2].as_ref().unwrap().fragment(), "b");
    }

    #[tokio::test]
    async fn test_blank_lines_and_crlf_are_ignored() {
        let frames = collect(&["\n\r\n{\"done\":false}\r\n\n{\"done\":true}\n"]).await;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.is_ok()));
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_decoded() {
        let frames = collect(&[
            "{\"message\":{\"role\":\"assistant\",\"content\":\"x\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"y\"},\"done\":false}",
        ])
        .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_ref().unwrap().fragment(), "y");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_nothing() {
        assert!(collect(&[]).await.is_empty());
        assert!(collect(&["", "  \n"]).await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let parts: Vec<Result<Vec<u8>>> = vec![
            Ok(b"{\"done\":false}\n".to_vec()),
            Err(TubechatError::Transport("connection reset".to_string())),
            Ok(b"{\"done\":true}\n".to_vec()),
        ];
        let frames: Vec<_> = decode_frames(stream::iter(parts)).collect().await;

        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(TubechatError::Transport(_))));
    }

    #[tokio::test]
    async fn test_byte_at_a_time_delivery() {
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"one\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"two\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );
        let bytes: Vec<String> = body.chars().map(|c| c.to_string()).collect();
        let parts: Vec<&str> = bytes.iter().map(String::as_str).collect();

        let frames = collect(&parts).await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap().fragment(), "one");
        assert_eq!(frames[1].as_ref().unwrap().fragment(), "two");
        assert!(frames[2].as_ref().unwrap().done);
    }

    #[tokio::test]
    async fn test_partial_line_then_several_lines_in_one_chunk() {
        let frames = collect(&[
            "{\"message\":{\"role\":\"assistant\",",
            "\"content\":\"a\"},\"done\":false}\n{\"message\":{\"role\":\"assistant\",\"content\":\"b\"},\"done\":false}\n{\"done\":",
            "true}\n",
        ])
        .await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap().fragment(), "a");
        assert_eq!(frames[1].as_ref().unwrap().fragment(), "b");
        assert!(frames[2].as_ref().unwrap().done);
    }
}
