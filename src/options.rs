//! Decoder configuration.

use serde::{Deserialize, Serialize};

use crate::event::DATA_PREFIX;

/// What to do with text left in the buffer when the stream ends without a
/// closing delimiter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPolicy {
    /// Drop it. A frame is only complete once its delimiter arrives.
    #[default]
    Discard,

    /// Interpret it as one final frame.
    Flush,
}

/// Options controlling how a chat stream is decoded.
///
/// # Example
/// ```rust
/// use chatwire::options::{DecoderOptions, TrailingPolicy};
///
/// let options = DecoderOptions::new()
///     .with_trailing(TrailingPolicy::Flush)
///     .with_max_buffer_bytes(64 * 1024);
///
/// assert_eq!(options.prefix, "data: ");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecoderOptions {
    /// Line prefix stripped from each frame before parsing
    pub prefix: String,

    /// Handling of undelimited text at end of stream
    pub trailing: TrailingPolicy,

    /// Upper bound on the undelimited buffer; `None` is unbounded
    pub max_buffer_bytes: Option<usize>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            prefix: DATA_PREFIX.to_string(),
            trailing: TrailingPolicy::Discard,
            max_buffer_bytes: None,
        }
    }
}

impl DecoderOptions {
    /// Create options with the defaults: `data: ` prefix, discard trailing text, no buffer limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the trailing-text policy.
    pub fn with_trailing(mut self, trailing: TrailingPolicy) -> Self {
        self.trailing = trailing;
        self
    }

    /// Set the buffer limit.
    pub fn with_max_buffer_bytes(mut self, limit: usize) -> Self {
        self.max_buffer_bytes = Some(limit);
        self
    }
}
