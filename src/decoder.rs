//! Callback-driven chat stream decoding.
//!
//! [`ChatDecoder`] is the per-stream state machine:
//!
//! ```text
//! STREAMING --(end of input)--> DRAINING --(reader released)--> COMPLETE
//! ```
//!
//! [`decode_stream`] drives it from a chunk source and dispatches each frame
//! to a [`ChatHandler`] before reading the next chunk.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::error::{DecodeError, FrameError, Result};
use crate::event::{interpret, ChatEvent};
use crate::frame::{FrameSplitter, SplitOutcome};
use crate::model::ChatState;
use crate::options::{DecoderOptions, TrailingPolicy};

/// Lifecycle phase of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    Streaming,
    Draining,
    Complete,
}

/// Counters describing a finished stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Non-blank frames handed to the interpreter
    pub frames: usize,
    /// Frames delivered as content or state
    pub delivered: usize,
    /// Frames rejected for a reported error or malformed payload
    pub rejected: usize,
    /// Whether undelimited trailing text was dropped at end of stream
    pub trailing_discarded: bool,
}

/// Receives decoded frames.
///
/// Each method is awaited before the decoder reads further input, so a slow
/// handler slows the stream down rather than overlapping with it.
#[async_trait]
pub trait ChatHandler: Send {
    /// A content delta, or a state-only update with empty `content`.
    async fn on_chunk(&mut self, content: String, state: Option<ChatState>);

    /// A frame was rejected. Diagnostic only; the stream continues.
    async fn on_frame_error(&mut self, _error: &FrameError) {}

    /// The stream has ended. Called exactly once per decode.
    async fn on_complete(&mut self);
}

/// Adapts a pair of closures into a [`ChatHandler`].
///
/// # Example
/// ```
/// use chatwire::decoder::{decode_stream, Callbacks};
/// use chatwire::options::DecoderOptions;
///
/// # async fn run() -> chatwire::Result<()> {
/// let body = futures::stream::iter(vec![Ok::<_, std::io::Error>(
///     b"data: {\"content\":\"Hi\"}\n\n".to_vec(),
/// )]);
///
/// let mut text = String::new();
/// let mut handler = Callbacks::new(|content, _state| text.push_str(&content), || {});
/// decode_stream(body, &DecoderOptions::default(), &mut handler).await?;
/// drop(handler);
/// assert_eq!(text, "Hi");
/// # Ok(())
/// # }
/// ```
pub struct Callbacks<C, D> {
    on_chunk: C,
    on_complete: D,
}

impl<C, D> Callbacks<C, D>
where
    C: FnMut(String, Option<ChatState>) + Send,
    D: FnMut() + Send,
{
    /// Wrap `on_chunk` and `on_complete`; frame errors are left to the default no-op.
    pub fn new(on_chunk: C, on_complete: D) -> Self {
        Self {
            on_chunk,
            on_complete,
        }
    }
}

#[async_trait]
impl<C, D> ChatHandler for Callbacks<C, D>
where
    C: FnMut(String, Option<ChatState>) + Send,
    D: FnMut() + Send,
{
    async fn on_chunk(&mut self, content: String, state: Option<ChatState>) {
        (self.on_chunk)(content, state)
    }

    async fn on_complete(&mut self) {
        (self.on_complete)()
    }
}

/// Per-stream decoding state: the frame buffer, the phase and counters.
#[derive(Debug)]
pub struct ChatDecoder {
    splitter: FrameSplitter,
    prefix: String,
    trailing: TrailingPolicy,
    phase: DecoderPhase,
    summary: DecodeSummary,
}

impl ChatDecoder {
    /// Create a decoder in the STREAMING phase.
    pub fn new(options: &DecoderOptions) -> Self {
        let splitter = match options.max_buffer_bytes {
            Some(limit) => FrameSplitter::with_limit(limit),
            None => FrameSplitter::new(),
        };
        Self {
            splitter,
            prefix: options.prefix.clone(),
            trailing: options.trailing,
            phase: DecoderPhase::Streaming,
            summary: DecodeSummary::default(),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    /// Counters so far; final once the phase is COMPLETE.
    pub fn summary(&self) -> DecodeSummary {
        self.summary
    }

    /// Feed one chunk; returns the frames it completed, in arrival order,
    /// and any buffer overflow. Deliver the frames before acting on the overflow.
    pub fn feed(&mut self, chunk: &[u8]) -> SplitOutcome {
        tracing::trace!(bytes = chunk.len(), "chunk received");
        self.splitter.feed(chunk)
    }

    /// Interpret one frame.
    ///
    /// `None` means the frame carried nothing to deliver.
    pub fn interpret(&mut self, frame: &str) -> Option<std::result::Result<ChatEvent, FrameError>> {
        self.summary.frames += 1;
        match interpret(frame, &self.prefix) {
            Ok(Some(ChatEvent::StreamError { message })) => {
                tracing::warn!(error = %message, "server reported error in frame");
                self.summary.rejected += 1;
                Some(Err(FrameError::Reported(message)))
            }
            Ok(Some(event)) => {
                self.summary.delivered += 1;
                Some(Ok(event))
            }
            Ok(None) => {
                tracing::debug!("frame without content or state ignored");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, frame = %frame, "failed to parse frame");
                self.summary.rejected += 1;
                Some(Err(FrameError::Malformed(err)))
            }
        }
    }

    /// Input is exhausted: enter DRAINING and resolve the trailing buffer.
    ///
    /// Returns the remainder only under [`TrailingPolicy::Flush`]. Does
    /// nothing unless the decoder is still STREAMING.
    pub fn drain(&mut self) -> Option<String> {
        if !self.enter_draining() {
            return None;
        }
        let rest = self.splitter.finish()?;
        match self.trailing {
            TrailingPolicy::Flush => {
                tracing::debug!(bytes = rest.len(), "flushing undelimited trailing frame");
                Some(rest)
            }
            TrailingPolicy::Discard => {
                self.discard(&rest);
                None
            }
        }
    }

    /// The stream failed: enter DRAINING and drop the trailing buffer
    /// regardless of policy. Does nothing unless the decoder is still STREAMING.
    pub fn abort(&mut self) {
        if !self.enter_draining() {
            return;
        }
        if let Some(rest) = self.splitter.finish() {
            self.discard(&rest);
        }
    }

    /// Enter the terminal phase. Only valid from DRAINING; otherwise a no-op.
    pub fn complete(&mut self) {
        if self.phase != DecoderPhase::Draining {
            tracing::debug!(phase = ?self.phase, "complete ignored outside DRAINING");
            return;
        }
        self.phase = DecoderPhase::Complete;
        tracing::debug!(
            frames = self.summary.frames,
            delivered = self.summary.delivered,
            rejected = self.summary.rejected,
            "chat stream complete"
        );
    }

    fn enter_draining(&mut self) -> bool {
        if self.phase != DecoderPhase::Streaming {
            tracing::debug!(phase = ?self.phase, "drain ignored outside STREAMING");
            return false;
        }
        self.phase = DecoderPhase::Draining;
        true
    }

    fn discard(&mut self, rest: &str) {
        tracing::debug!(bytes = rest.len(), "discarding undelimited trailing text");
        self.summary.trailing_discarded = true;
    }
}

/// Exclusive owner of the transport's chunk source.
///
/// Dropping it releases the source; ownership makes that happen exactly once.
pub(crate) struct ChunkReader<S> {
    inner: Pin<Box<S>>,
}

impl<S, B, E> ChunkReader<S>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<DecodeError>,
{
    pub(crate) fn new(source: S) -> Self {
        Self {
            inner: Box::pin(source),
        }
    }

    /// Next chunk, `Ok(None)` at end of input.
    pub(crate) async fn next_chunk(&mut self) -> Result<Option<B>> {
        match self.inner.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }
}

impl<S> Drop for ChunkReader<S> {
    fn drop(&mut self) {
        tracing::trace!("chunk reader released");
    }
}

/// Decode a chunk source, dispatching every frame to `handler`.
///
/// `on_complete` runs exactly once, after the last `on_chunk`, whether the
/// source ended normally or failed. A transport failure is returned after
/// completion; frame-level failures never are.
pub async fn decode_stream<S, B, E, H>(
    source: S,
    options: &DecoderOptions,
    handler: &mut H,
) -> Result<DecodeSummary>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<DecodeError>,
    H: ChatHandler + ?Sized,
{
    let mut decoder = ChatDecoder::new(options);
    let outcome = read_all(ChunkReader::new(source), &mut decoder, handler).await;
    if let Err(err) = &outcome {
        tracing::warn!(error = %err, "chat stream terminated");
        decoder.abort();
    }

    decoder.complete();
    handler.on_complete().await;
    outcome.map(|()| decoder.summary())
}

async fn read_all<S, B, E, H>(
    mut reader: ChunkReader<S>,
    decoder: &mut ChatDecoder,
    handler: &mut H,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<DecodeError>,
    H: ChatHandler + ?Sized,
{
    while let Some(chunk) = reader.next_chunk().await? {
        let SplitOutcome { frames, overflow } = decoder.feed(chunk.as_ref());
        for frame in frames {
            dispatch(decoder, handler, &frame).await;
        }
        if let Some(err) = overflow {
            return Err(err);
        }
    }
    drop(reader);

    if let Some(frame) = decoder.drain() {
        dispatch(decoder, handler, &frame).await;
    }
    Ok(())
}

async fn dispatch<H>(decoder: &mut ChatDecoder, handler: &mut H, frame: &str)
where
    H: ChatHandler + ?Sized,
{
    match decoder.interpret(frame) {
        Some(Ok(ChatEvent::ContentDelta { text, state })) => handler.on_chunk(text, state).await,
        Some(Ok(ChatEvent::StateUpdate { state })) => {
            handler.on_chunk(String::new(), Some(state)).await
        }
        Some(Ok(ChatEvent::StreamError { message })) => {
            handler.on_frame_error(&FrameError::Reported(message)).await
        }
        Some(Err(err)) => handler.on_frame_error(&err).await,
        None => {}
    }
}
