//! Decoding chat streams straight from `reqwest` responses.

use futures::Stream;

use crate::decoder::{decode_stream, ChatHandler, DecodeSummary};
use crate::error::Result;
use crate::event::ChatEvent;
use crate::options::DecoderOptions;
use crate::stream::events;

/// Extension trait for `reqwest::Response` to decode a streamed chat body.
///
/// # Example
/// ```ignore
/// use futures::StreamExt;
/// use chatwire::sse::ChatResponseExt;
///
/// let response = client.post(url).json(&query).send().await?;
/// let mut stream = Box::pin(response.chat_events(DecoderOptions::default()));
/// while let Some(event) = stream.next().await {
///     print!("{}", event?.text());
/// }
/// ```
pub trait ChatResponseExt {
    /// Convert the response body into a stream of chat events.
    fn chat_events(self, options: DecoderOptions) -> impl Stream<Item = Result<ChatEvent>> + Send;
}

impl ChatResponseExt for reqwest::Response {
    fn chat_events(self, options: DecoderOptions) -> impl Stream<Item = Result<ChatEvent>> + Send {
        events(self.bytes_stream(), options)
    }
}

/// Decode a response body, dispatching every frame to `handler`.
///
/// See [`decode_stream`] for the completion and error contract.
pub async fn decode_response<H>(
    response: reqwest::Response,
    options: &DecoderOptions,
    handler: &mut H,
) -> Result<DecodeSummary>
where
    H: ChatHandler + ?Sized,
{
    decode_stream(response.bytes_stream(), options, handler).await
}
