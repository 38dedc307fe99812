//! OpenAI Chat Completions API driver.
//!
//! This module implements [`CompletionService`] for the Chat Completions API,
//! turning the server-sent event stream into plain text fragments.

use futures::StreamExt;

use super::{CompletionError, CompletionRequest, CompletionService, FragmentStream, LlmSettings};

/// Longest error body kept on [`CompletionError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Create a driver that reuses an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }

    /// Endpoint this driver posts to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.settings.provider.build_chat_url(&self.settings.base_url)
    }
}

#[async_trait::async_trait]
impl CompletionService for ChatCompletionsDriver {
    async fn stream(&self, req: CompletionRequest) -> Result<FragmentStream, CompletionError> {
        let url = self.endpoint();

        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": true,
            "messages": req.messages,
        });

        tracing::debug!(
            name: "llm.request.sent",
            url = %url,
            model = %self.settings.model,
            message_count = req.messages.len(),
            "Sending completion request"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let byte_stream = resp.bytes_stream();

        let out = async_stream::try_stream! {
            let mut frames = FrameBuffer::default();
            let mut done = false;

            futures::pin_mut!(byte_stream);
            'outer: while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                frames.push(&chunk);

                while let Some(frame) = frames.next_frame() {
                    for data in data_lines(&frame) {
                        match parse_data(data)? {
                            Chunk::Text(text) => yield text,
                            Chunk::Done => {
                                done = true;
                                break 'outer;
                            }
                            Chunk::Skip => {}
                        }
                    }
                }
            }

            // The body may close without a trailing blank line.
            if !done {
                if let Some(frame) = frames.finish() {
                    for data in data_lines(&frame) {
                        if let Chunk::Text(text) = parse_data(data)? {
                            yield text;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(out))
    }
}

/// Decoded content of one `data:` line.
#[derive(Debug, PartialEq, Eq)]
enum Chunk {
    Text(String),
    Done,
    Skip,
}

/// Reassembles SSE frames from arbitrarily split byte chunks.
#[derive(Debug, Default)]
struct FrameBuffer {
    buf: Vec<u8>,
    /// Bytes already searched without finding a frame end.
    scanned: usize,
}

impl FrameBuffer {
    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, if any.
    fn next_frame(&mut self) -> Option<String> {
        // A separator may straddle the old and new bytes.
        let from = self.scanned.saturating_sub(3);
        let Some((pos, sep_len)) = find_frame_end(&self.buf[from..]) else {
            self.scanned = self.buf.len();
            return None;
        };
        let end = from + pos;
        let frame = self.buf.drain(..end + sep_len).collect::<Vec<_>>();
        self.scanned = 0;
        Some(String::from_utf8_lossy(&frame[..end]).into_owned())
    }

    /// Whatever is left once the body ends.
    fn finish(self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buf);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

/// Find the end of a frame: a blank line in either `\n` or `\r\n` form.
fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn data_lines(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
}

fn parse_data(data: &str) -> Result<Chunk, CompletionError> {
    if data == "[DONE]" {
        return Ok(Chunk::Done);
    }
    if data.is_empty() {
        return Ok(Chunk::Skip);
    }

    let v: serde_json::Value = serde_json::from_str(data)?;

    if let Some(err) = v.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map_or_else(|| err.to_string(), ToString::to_string);
        return Err(CompletionError::Service(message));
    }

    match v["choices"][0]["delta"].get("content").and_then(|c| c.as_str()) {
        Some(text) if !text.is_empty() => Ok(Chunk::Text(text.to_string())),
        _ => Ok(Chunk::Skip),
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
