//! Splitting a chunked byte stream into `\n\n`-delimited frames.
//!
//! Wire format:
//! ```text
//! data: {"content": "Hel"}
//!
//! data: {"content": "lo"}
//!
//! ```
//!
//! A frame is only complete once the delimiter that follows it has arrived.
//! Everything after the last delimiter stays buffered for the next chunk.

use crate::error::DecodeError;
use crate::utf8::Utf8Decoder;

/// Delimiter between frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// What one chunk produced.
#[derive(Debug, Default)]
pub struct SplitOutcome {
    /// Frames completed by the chunk, in arrival order
    pub frames: Vec<String>,
    /// Set when the undelimited tail outgrew the buffer limit. Terminal, but
    /// only after `frames` have been delivered.
    pub overflow: Option<DecodeError>,
}

/// Accumulates decoded chunk text and emits complete frames in order.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    utf8: Utf8Decoder,
    buffer: String,
    /// Byte offset where the next delimiter search starts.
    scan_from: usize,
    max_buffer_bytes: Option<usize>,
}

impl FrameSplitter {
    /// Create a splitter with an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a splitter that reports an overflow once the undelimited tail grows past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            max_buffer_bytes: Some(limit),
            ..Self::default()
        }
    }

    /// Feed one chunk and return the frames it completed.
    ///
    /// Whitespace-only frames are dropped here and never reach the interpreter.
    ///
    /// # Example
    /// ```
    /// use chatwire::frame::FrameSplitter;
    ///
    /// let mut splitter = FrameSplitter::new();
    /// assert!(splitter.feed(b"data: {}\n").frames.is_empty());
    /// assert_eq!(splitter.feed(b"\ndata: ").frames, vec!["data: {}"]);
    /// assert_eq!(splitter.remainder(), "data: ");
    /// ```
    pub fn feed(&mut self, chunk: &[u8]) -> SplitOutcome {
        self.utf8.decode(chunk, &mut self.buffer);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search = self.scan_from;
        while let Some(pos) = self.buffer[search..].find(FRAME_DELIMITER) {
            let end = search + pos;
            let frame = &self.buffer[start..end];
            if !frame.trim().is_empty() {
                frames.push(frame.to_string());
            }
            start = end + FRAME_DELIMITER.len();
            search = start;
        }
        self.buffer.drain(..start);

        // A lone trailing '\n' may be the first half of the next delimiter.
        self.scan_from = if self.buffer.ends_with('\n') {
            self.buffer.len() - 1
        } else {
            self.buffer.len()
        };

        let overflow = self
            .max_buffer_bytes
            .filter(|limit| self.buffer.len() > *limit)
            .map(|limit| DecodeError::BufferOverflow { limit });

        SplitOutcome { frames, overflow }
    }

    /// The buffered text not yet resolved into a frame.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// End of input: flush the UTF-8 decoder and take the remainder.
    ///
    /// Returns `None` when nothing but whitespace was left over.
    pub fn finish(&mut self) -> Option<String> {
        self.utf8.finish(&mut self.buffer);
        self.scan_from = 0;
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_all(chunks: &[&[u8]]) -> (Vec<String>, Option<String>) {
        let mut splitter = FrameSplitter::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            let outcome = splitter.feed(chunk);
            assert!(outcome.overflow.is_none());
            frames.extend(outcome.frames);
        }
        let rest = splitter.finish();
        (frames, rest)
    }

    #[test]
    fn test_single_chunk_multiple_frames() {
        let (frames, rest) = split_all(&[b"data: a\n\ndata: b\n\n"]);
        assert_eq!(frames, vec!["data: a", "data: b"]);
        assert_eq!(rest, None);
    }

    #[test]
    fn test_delimiter_split_across_chunks() {
        let (frames, rest) = split_all(&[b"data: a\n", b"\ndata: b"]);
        assert_eq!(frames, vec!["data: a"]);
        assert_eq!(rest.as_deref(), Some("data: b"));
    }

    #[test]
    fn test_whitespace_frames_are_dropped() {
        let (frames, _) = split_all(&[b"\n\n  \n\ndata: a\n\n\n\n"]);
        assert_eq!(frames, vec!["data: a"]);
    }

    #[test]
    fn test_triple_newline_keeps_leading_newline() {
        // Same segmentation as splitting the whole text on "\n\n".
        let (frames, _) = split_all(&[b"a\n\n\nb\n\n"]);
        assert_eq!(frames, vec!["a", "\nb"]);
    }

    #[test]
    fn test_one_byte_at_a_time_matches_whole() {
        let input = "data: {\"content\":\"héllo\"}\n\n\ndata: {\"content\":\"🦀\"}\n\ntail";
        let whole = split_all(&[input.as_bytes()]);
        let chunks: Vec<&[u8]> = input.as_bytes().chunks(1).collect();
        assert_eq!(split_all(&chunks), whole);
        assert_eq!(whole.1.as_deref(), Some("tail"));
    }

    #[test]
    fn test_remainder_tracks_incomplete_frame() {
        let mut splitter = FrameSplitter::new();
        splitter.feed(b"data: one\n\ndata: tw");
        assert_eq!(splitter.remainder(), "data: tw");
        assert_eq!(splitter.feed(b"o\n\n").frames, vec!["data: two"]);
        assert_eq!(splitter.remainder(), "");
    }

    #[test]
    fn test_buffer_limit() {
        let mut splitter = FrameSplitter::with_limit(8);
        assert!(splitter.feed(b"data: 1\n\n").overflow.is_none());
        let outcome = splitter.feed(b"data: 123456789");
        assert!(outcome.frames.is_empty());
        assert!(matches!(outcome.overflow, Some(DecodeError::BufferOverflow { limit: 8 })));
    }

    #[test]
    fn test_frames_before_overflow_are_kept() {
        let mut splitter = FrameSplitter::with_limit(24);
        let outcome = splitter.feed(b"data: {\"content\":\"a\"}\n\ndata: {\"content\":\"bbbbbbbbbbbbbbbb");
        assert_eq!(outcome.frames, vec![r#"data: {"content":"a"}"#]);
        assert!(matches!(outcome.overflow, Some(DecodeError::BufferOverflow { limit: 24 })));
    }
}
