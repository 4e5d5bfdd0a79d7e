//! Stateful frame accumulation
//!
//! Transport chunks arrive at arbitrary boundaries. The accumulator buffers
//! bytes until a full line is available, then collects `data:` lines until
//! the blank line that terminates a frame.

use bytes::Bytes;
use tracing::warn;

use crate::sse::decoder::parse_sse_line;
use crate::sse::events::SseLine;

/// Longest line kept, in bytes. Longer lines are dropped.
pub const MAX_LINE_LEN: usize = 4 * 1024 * 1024;

/// Stateful SSE accumulator that turns raw chunks into frames
#[derive(Debug)]
pub struct SseFrameAccumulator {
    /// Bytes of the current incomplete line
    line_buffer: Vec<u8>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
    max_line_len: usize,
    /// Skipping the rest of an over-long line
    discarding: bool,
}

impl Default for SseFrameAccumulator {
    fn default() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }
}

impl SseFrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            line_buffer: Vec::new(),
            data_buffer: Vec::new(),
            max_line_len,
            discarding: false,
        }
    }

    /// Feed a chunk of bytes, returning every frame it completes.
    ///
    /// Comment lines are returned as frames of their own, verbatim, so that
    /// the decoder sees and discards them as heartbeats.
    pub fn feed(&mut self, chunk: &Bytes) -> Vec<String> {
        let mut frames = Vec::new();

        for &byte in chunk.iter() {
            if byte == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                let raw = std::mem::take(&mut self.line_buffer);
                let decoded = String::from_utf8_lossy(&raw);
                let line = decoded.strip_suffix('\r').unwrap_or(decoded.as_ref());
                if let Some(frame) = self.feed_line(line) {
                    frames.push(frame);
                }
            } else if self.discarding {
                continue;
            } else if self.line_buffer.len() >= self.max_line_len {
                warn!(
                    max_line_len = self.max_line_len,
                    "Dropping over-long SSE line"
                );
                self.line_buffer = Vec::new();
                self.discarding = true;
            } else {
                self.line_buffer.push(byte);
            }
        }

        frames
    }

    /// Feed one complete line (without its terminator).
    pub fn feed_line(&mut self, line: &str) -> Option<String> {
        match parse_sse_line(line) {
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                None
            }
            SseLine::Empty => self.take_frame(),
            SseLine::Comment(comment) => Some(comment),
            // Event names, ids and retry hints carry nothing the decoder uses
            SseLine::Event(_) | SseLine::Other(_) => None,
        }
    }

    fn take_frame(&mut self) -> Option<String> {
        if self.data_buffer.is_empty() {
            return None;
        }
        let frame = self.data_buffer.join("\n");
        self.data_buffer.clear();
        Some(frame)
    }
}
