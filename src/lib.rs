//! # chatwire - Incremental chat stream decoding
//!
//! Decodes a chunked chat response body into typed events as the chunks
//! arrive. The body is a sequence of UTF-8 frames separated by `\n\n`, each
//! optionally prefixed with `data: ` and carrying a JSON object:
//!
//! ```text
//! data: {"content": "Hel", "state": {"sources": [{"file_name": "notes.pdf"}]}}
//!
//! data: {"state": {"followUpQuestions": ["Anything else?"]}}
//!
//! ```
//!
//! ## Features
//! - Chunk boundaries are invisible: multi-byte characters and delimiters may be split anywhere
//! - Per-frame isolation: error frames and malformed frames are logged and skipped
//! - Callback API ([`decode_stream`]) with exactly-once completion
//! - Pull API ([`events`]) as a `futures::Stream`
//! - `reqwest` integration ([`sse::ChatResponseExt`])
//!
//! ## Example
//! ```no_run
//! use chatwire::{decode_response, Callbacks, DecoderOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let response = reqwest::Client::new()
//!         .post("http://localhost:8000/chat")
//!         .json(&serde_json::json!({ "message": "Hello!" }))
//!         .send()
//!         .await?;
//!
//!     let mut handler = Callbacks::new(
//!         |content: String, _state| print!("{}", content),
//!         || println!(),
//!     );
//!     decode_response(response, &DecoderOptions::default(), &mut handler).await?;
//!     Ok(())
//! }
//! ```

pub mod decoder;
pub mod error;
pub mod event;
pub mod frame;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;
pub mod utf8;

// Re-exports for convenience
pub use decoder::{decode_stream, Callbacks, ChatDecoder, ChatHandler, DecodeSummary, DecoderPhase};
pub use error::{DecodeError, FrameError, Result};
pub use event::{interpret, ChatEvent};
pub use model::{ChatState, Source};
pub use options::{DecoderOptions, TrailingPolicy};
pub use sse::{decode_response, ChatResponseExt};
pub use stream::{collect_reply, events, ChatReply};
