//! Line framer for engine output streams.
//!
//! [`LineFramer`] is a [`tokio_util::codec::Decoder`] that slices an
//! unbounded byte stream into newline-terminated text lines. The incomplete
//! trailing fragment stays in the framed read buffer until its newline
//! arrives, so the lines produced never depend on how the bytes were chunked.
//!
//! Decoding is best-effort: invalid UTF-8 is replaced rather than rejected,
//! surrounding whitespace (including a `\r` before the `\n`) is trimmed, and
//! blank lines are dropped because they carry no protocol meaning.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use chesscli_engine::engine::codec::LineFramer;
//!
//! let lines = FramedRead::new(child_stdout, LineFramer::new());
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Maximum line length accepted by the framer: 1 MiB.
///
/// A line exceeding this limit is discarded up to its terminating newline
/// instead of being buffered without bound.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited, lossy UTF-8 line decoder.
#[derive(Debug)]
pub struct LineFramer {
    /// Offset into the buffer already scanned for a newline.
    next_index: usize,
    max_length: usize,
    /// Set while skipping the remainder of an over-long line.
    discarding: bool,
}

impl LineFramer {
    /// Create a framer with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_BYTES)
    }

    /// Create a framer that discards lines longer than `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
            discarding: false,
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineFramer {
    type Item = String;
    type Error = AppError;

    /// Decode the next complete, non-blank line from `src`.
    ///
    /// Returns `Ok(None)` while `src` holds no complete line yet.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let read_to = src.len().min(self.max_length.saturating_add(1));
            let newline = src[self.next_index..read_to]
                .iter()
                .position(|&b| b == b'\n');

            match (self.discarding, newline) {
                (true, Some(offset)) => {
                    src.advance(self.next_index + offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(offset)) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let raw = src.split_to(end + 1);
                    if let Some(line) = clean_line(&raw[..end]) {
                        return Ok(Some(line));
                    }
                }
                (false, None) if src.len() > self.max_length => {
                    warn!(
                        max_length = self.max_length,
                        "line framer: discarding over-long line"
                    );
                    self.next_index = 0;
                    self.discarding = true;
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    /// Decode whatever complete lines remain when the stream closes.
    ///
    /// An unterminated trailing fragment is dropped: the engine never
    /// finished writing it, so it is not a protocol line.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        if !src.is_empty() {
            debug!(
                bytes = src.len(),
                "line framer: dropping unterminated trailing fragment"
            );
            src.clear();
        }
        self.next_index = 0;
        self.discarding = false;
        Ok(None)
    }
}

/// Lossily decode `raw`, trim it, and return it unless blank.
fn clean_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
