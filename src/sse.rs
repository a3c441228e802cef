//! Server-Sent Events (SSE) decoding for streamed completions.
//!
//! SSE format:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```

use async_stream::try_stream;
use bytes::BytesMut;
use futures::{Stream, StreamExt};

use crate::client::ClientError;

/// Incremental line decoder. Bytes are buffered until a full line arrives, so
/// multi-byte characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and return the data payloads completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            self.accept(&line, &mut events);
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = self.buffer.split();
            self.accept(&line, &mut events);
        }
        events
    }

    /// True once the `[DONE]` marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn accept(&mut self, line: &[u8], events: &mut Vec<String>) {
        if self.done {
            return;
        }
        let line = String::from_utf8_lossy(line);
        if let Some(data) = parse_sse_line(line.trim()) {
            if is_done_marker(data) {
                self.done = true;
            } else {
                events.push(data.to_string());
            }
        }
    }
}

/// Extension trait turning a streamed response into SSE data payloads.
pub trait SseResponseExt {
    /// Stream of `data:` payloads, ending at `[DONE]` or at end of body.
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl SseResponseExt for reqwest::Response {
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        try_stream! {
            let mut bytes = self.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                for data in decoder.push(&chunk) {
                    yield data;
                }
                if decoder.is_done() {
                    break;
                }
            }

            for data in decoder.finish() {
                yield data;
            }
        }
    }
}

/// Parse an SSE line to extract the data portion.
///
/// # Example
/// ```
/// use minds::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"key\": \"value\"}"), Some("{\"key\": \"value\"}"));
/// assert_eq!(parse_sse_line(": keep-alive"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|s| s.trim())
}

/// Check if an SSE data line indicates the stream is done.
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}
