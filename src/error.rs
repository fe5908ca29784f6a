//! Error types for chat stream decoding.

use thiserror::Error;

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Terminal errors that end a stream.
///
/// Per-frame problems never surface here; see [`FrameError`].
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Undelimited buffer exceeded {limit} bytes")]
    BufferOverflow { limit: usize },
}

/// A frame that was rejected without stopping the stream.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The server reported an error inside the frame payload.
    #[error("Server reported error: {0}")]
    Reported(String),

    /// The frame was not valid JSON, or had the wrong field types.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}
