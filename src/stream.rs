//! Pull-based chat stream decoding.
//!
//! [`events`] turns a chunk source into a `futures::Stream` of [`ChatEvent`]s,
//! for callers that prefer `while let Some(..) = stream.next().await` over
//! callbacks.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;

use crate::decoder::{ChatDecoder, ChunkReader, DecoderPhase};
use crate::error::{DecodeError, Result};
use crate::event::ChatEvent;
use crate::frame::SplitOutcome;
use crate::model::ChatState;
use crate::options::DecoderOptions;

/// Decode a chunk source into a stream of events.
///
/// Rejected frames come through as [`ChatEvent::StreamError`] and the stream
/// carries on. A transport failure is yielded once as `Err`, after which the
/// stream ends.
///
/// # Example
/// ```
/// use futures::StreamExt;
/// use chatwire::options::DecoderOptions;
/// use chatwire::stream::events;
///
/// # async fn run() {
/// let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(
///     b"data: {\"content\":\"Hi\"}\n\n".to_vec(),
/// )]);
/// let mut stream = Box::pin(events(body, DecoderOptions::default()));
/// while let Some(event) = stream.next().await {
///     println!("{:?}", event);
/// }
/// # }
/// ```
pub fn events<S, B, E>(
    source: S,
    options: DecoderOptions,
) -> impl Stream<Item = Result<ChatEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Into<DecodeError> + Send,
{
    let state = EventState {
        decoder: ChatDecoder::new(&options),
        reader: Some(ChunkReader::new(source)),
        frames: VecDeque::new(),
        failure: None,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            // Deliver buffered frames before reading more input
            while let Some(frame) = state.frames.pop_front() {
                match state.decoder.interpret(&frame) {
                    Some(Ok(event)) => return Some((Ok(event), state)),
                    Some(Err(err)) => return Some((Ok(ChatEvent::from(err)), state)),
                    None => {}
                }
            }

            if let Some(err) = state.failure.take() {
                return Some((Err(err), state.terminate()));
            }

            if state.decoder.phase() != DecoderPhase::Streaming {
                if state.decoder.phase() == DecoderPhase::Draining {
                    state.decoder.complete();
                }
                return None;
            }

            let Some(reader) = state.reader.as_mut() else {
                return None;
            };

            let next = reader.next_chunk().await;
            match next {
                Ok(Some(chunk)) => {
                    let SplitOutcome { frames, overflow } = state.decoder.feed(chunk.as_ref());
                    state.frames.extend(frames);
                    if let Some(err) = overflow {
                        // Frames completed by this chunk still go out first
                        state.reader = None;
                        state.failure = Some(err);
                    }
                }
                Ok(None) => {
                    state.reader = None;
                    if let Some(frame) = state.decoder.drain() {
                        state.frames.push_back(frame);
                    }
                }
                Err(err) => return Some((Err(err), state.terminate())),
            }
        }
    })
}

struct EventState<S> {
    decoder: ChatDecoder,
    reader: Option<ChunkReader<S>>,
    frames: VecDeque<String>,
    /// Terminal error held back until `frames` are delivered
    failure: Option<DecodeError>,
}

impl<S> EventState<S> {
    /// Release the reader and finish through DRAINING after a terminal error.
    fn terminate(mut self) -> Self {
        self.reader = None;
        self.frames.clear();
        self.decoder.abort();
        self.decoder.complete();
        self
    }
}

/// A fully collected assistant reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    /// Concatenated content deltas
    pub text: String,
    /// Most recent state snapshot
    pub state: Option<ChatState>,
    /// Messages of rejected frames
    pub errors: Vec<String>,
}

/// Drain an event stream into a [`ChatReply`].
///
/// Stops at the first transport error.
pub async fn collect_reply<S>(stream: S) -> Result<ChatReply>
where
    S: Stream<Item = Result<ChatEvent>>,
{
    futures::pin_mut!(stream);

    let mut reply = ChatReply::default();
    while let Some(event) = stream.next().await {
        match event? {
            ChatEvent::ContentDelta { text, state } => {
                reply.text.push_str(&text);
                if state.is_some() {
                    reply.state = state;
                }
            }
            ChatEvent::StateUpdate { state } => reply.state = Some(state),
            ChatEvent::StreamError { message } => reply.errors.push(message),
        }
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn source(chunks: Vec<&'static str>) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))))
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let body = source(vec![
            "data: {\"content\":\"Hel\"}\n\nda",
            "ta: {\"content\":\"lo\"}\n\n",
            "data: {\"state\":{\"followUpQuestions\":[\"more?\"]}}\n\n",
        ]);
        let collected: Vec<_> = events(body, DecoderOptions::default()).collect().await;
        let collected: Vec<ChatEvent> = collected.into_iter().map(|e| e.unwrap()).collect();

        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].text(), "Hel");
        assert_eq!(collected[1].text(), "lo");
        assert_eq!(
            collected[2],
            ChatEvent::StateUpdate {
                state: ChatState::with_follow_ups(vec!["more?".to_string()])
            }
        );
    }

    #[tokio::test]
    async fn test_bad_frames_become_error_events() {
        let body = source(vec!["data: {\"error\":\"x\"}\n\ndata: oops\n\ndata: {\"content\":\"Y\"}\n\n"]);
        let reply = collect_reply(events(body, DecoderOptions::default())).await.unwrap();
        assert_eq!(reply.text, "Y");
        assert_eq!(reply.errors.len(), 2);
        assert_eq!(reply.errors[0], "x");
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"content\":\"a\"}\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"data: {\"content\":\"b\"}\n\n")),
        ]);
        let collected: Vec<_> = events(body, DecoderOptions::default()).collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].as_ref().unwrap().text(), "a");
        assert!(matches!(collected[1], Err(DecodeError::Io(_))));
    }

    #[tokio::test]
    async fn test_collect_keeps_latest_state() {
        let body = source(vec![
            "{\"state\":{\"sources\":[{\"file_name\":\"a.pdf\"}]}}\n\n",
            "{\"content\":\"done\",\"state\":{}}\n\n",
        ]);
        let reply = collect_reply(events(body, DecoderOptions::default())).await.unwrap();
        assert_eq!(reply.text, "done");
        assert_eq!(reply.state, Some(ChatState::default()));
        assert!(reply.errors.is_empty());
    }

    #[tokio::test]
    async fn test_frames_before_overflow_are_yielded() {
        let body = source(vec!["data: {\"content\":\"a\"}\n\ndata: {\"content\":\"bbbbbbbbbbbbbbbbbbbb"]);
        let options = DecoderOptions::default().with_max_buffer_bytes(24);
        let collected: Vec<_> = events(body, options).collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].as_ref().unwrap().text(), "a");
        assert!(matches!(collected[1], Err(DecodeError::BufferOverflow { limit: 24 })));
    }
}
