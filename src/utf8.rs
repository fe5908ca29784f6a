//! Incremental UTF-8 decoding for chunked byte streams.
//!
//! Network chunks can end in the middle of a multi-byte character. Decoding
//! each chunk on its own would corrupt those characters, so the decoder keeps
//! the incomplete tail of one chunk and prepends it to the next.

const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder.
///
/// Invalid byte sequences are replaced with U+FFFD, the same way a
/// non-fatal text decoder behaves. At most three bytes of an incomplete
/// character are ever held back.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no pending bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` and append the text to `out`.
    ///
    /// A trailing incomplete character is retained until the next call.
    ///
    /// # Example
    /// ```
    /// use chatwire::utf8::Utf8Decoder;
    ///
    /// let mut decoder = Utf8Decoder::new();
    /// let mut text = String::new();
    /// let bytes = "é".as_bytes();
    /// decoder.decode(&bytes[..1], &mut text);
    /// assert_eq!(text, "");
    /// decoder.decode(&bytes[1..], &mut text);
    /// assert_eq!(text, "é");
    /// ```
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) {
        let joined;
        let mut rest: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.pending);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(REPLACEMENT);
                            rest = &rest[valid + invalid..];
                        }
                        None => {
                            // Incomplete sequence at the end of input.
                            self.pending.extend_from_slice(&rest[valid..]);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Flush any held-back bytes at end of stream.
    ///
    /// An incomplete character can never be completed now, so it decodes to
    /// a single replacement character.
    pub fn finish(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(REPLACEMENT);
        }
    }

    /// Whether bytes of an incomplete character are being held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for chunk in chunks {
            decoder.decode(chunk, &mut out);
        }
        decoder.finish(&mut out);
        out
    }

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(decode_all(&[b"hello ", b"world"]), "hello world");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "日本語 🦀";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            assert_eq!(decode_all(&[&bytes[..split], &bytes[split..]]), text);
        }
    }

    #[test]
    fn test_one_byte_at_a_time() {
        let text = "naïve 🦀 café";
        let chunks: Vec<&[u8]> = text.as_bytes().chunks(1).collect();
        assert_eq!(decode_all(&chunks), text);
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        assert_eq!(decode_all(&[b"a\xffb"]), "a\u{FFFD}b");
    }

    #[test]
    fn test_multibyte_text_around_invalid_byte() {
        let bytes = [&"日".as_bytes()[..], b"\xff", "本".as_bytes()].concat();
        let (head, tail) = bytes.split_at(2);
        assert_eq!(decode_all(&[head, tail]), "日\u{FFFD}本");
    }

    #[test]
    fn test_incomplete_tail_flushes_to_replacement() {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        decoder.decode(&"🦀".as_bytes()[..2], &mut out);
        assert!(decoder.has_pending());
        assert_eq!(out, "");

        decoder.finish(&mut out);
        assert!(!decoder.has_pending());
        assert_eq!(out, "\u{FFFD}");
    }
}
