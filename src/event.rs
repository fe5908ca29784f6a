//! Interpreting complete frames as typed chat events.

use crate::error::FrameError;
use crate::model::{ChatState, Payload, RawPayload};

/// Default line prefix carried by each frame.
pub const DATA_PREFIX: &str = "data: ";

/// A decoded unit delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Incremental assistant output, optionally with the state at that point.
    ContentDelta {
        text: String,
        state: Option<ChatState>,
    },

    /// State snapshot without content.
    StateUpdate { state: ChatState },

    /// Frame-level failure. The stream carries on after it.
    StreamError { message: String },
}

impl ChatEvent {
    /// Content text, empty for state updates and errors.
    pub fn text(&self) -> &str {
        match self {
            ChatEvent::ContentDelta { text, .. } => text,
            ChatEvent::StateUpdate { .. } | ChatEvent::StreamError { .. } => "",
        }
    }

    /// State carried by the event, if any.
    pub fn state(&self) -> Option<&ChatState> {
        match self {
            ChatEvent::ContentDelta { state, .. } => state.as_ref(),
            ChatEvent::StateUpdate { state } => Some(state),
            ChatEvent::StreamError { .. } => None,
        }
    }
}

impl From<FrameError> for ChatEvent {
    fn from(err: FrameError) -> Self {
        let message = match err {
            FrameError::Reported(message) => message,
            FrameError::Malformed(err) => format!("malformed frame: {}", err),
        };
        ChatEvent::StreamError { message }
    }
}

/// Strip `prefix` from a frame if present.
///
/// Surrounding whitespace is trimmed first; frames without the prefix are
/// returned as-is.
///
/// # Example
/// ```
/// use chatwire::event::strip_prefix;
///
/// assert_eq!(strip_prefix("data: {}", "data: "), "{}");
/// assert_eq!(strip_prefix("\n{}", "data: "), "{}");
/// ```
pub fn strip_prefix<'a>(frame: &'a str, prefix: &str) -> &'a str {
    let frame = frame.trim();
    frame.strip_prefix(prefix).unwrap_or(frame)
}

/// Parse and classify a single frame.
///
/// Returns `Ok(None)` for frames that carry neither content, state nor an
/// error; those are ignored. An error field yields a
/// [`ChatEvent::StreamError`]. Unparseable text is an `Err`, which callers
/// log and skip.
pub fn interpret(frame: &str, prefix: &str) -> Result<Option<ChatEvent>, serde_json::Error> {
    let raw: RawPayload = serde_json::from_str(strip_prefix(frame, prefix))?;

    let event = match Payload::try_from(raw)? {
        Payload::Error(message) => Some(ChatEvent::StreamError { message }),
        Payload::Content { content, state } => Some(ChatEvent::ContentDelta {
            text: content,
            state,
        }),
        Payload::State(state) => Some(ChatEvent::StateUpdate { state }),
        Payload::Empty => None,
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_frame() {
        let event = interpret(r#"data: {"content":"Hi"}"#, DATA_PREFIX).unwrap();
        assert_eq!(
            event,
            Some(ChatEvent::ContentDelta {
                text: "Hi".to_string(),
                state: None
            })
        );
    }

    #[test]
    fn test_unprefixed_frame() {
        // The backend writes bare JSON objects.
        let event = interpret(r#"{"state": {}}"#, DATA_PREFIX).unwrap();
        assert_eq!(
            event,
            Some(ChatEvent::StateUpdate {
                state: ChatState::default()
            })
        );
    }

    #[test]
    fn test_error_frame() {
        let event = interpret(r#"data: {"error":"x"}"#, DATA_PREFIX).unwrap();
        assert_eq!(
            event,
            Some(ChatEvent::StreamError {
                message: "x".to_string()
            })
        );
    }

    #[test]
    fn test_ignored_frame() {
        assert_eq!(interpret(r#"data: {"other": 1}"#, DATA_PREFIX).unwrap(), None);
    }

    #[test]
    fn test_malformed_frame() {
        assert!(interpret("data: {not json", DATA_PREFIX).is_err());
        assert!(interpret(r#"data: {"content": 42}"#, DATA_PREFIX).is_err());
        assert!(interpret("data: [DONE]", DATA_PREFIX).is_err());
    }

    #[test]
    fn test_prefix_stripped_only_once() {
        assert!(interpret(r#"data: data: {"content":"x"}"#, DATA_PREFIX).is_err());
    }

    #[test]
    fn test_custom_prefix() {
        let event = interpret(r#"msg> {"content":"y"}"#, "msg> ").unwrap().unwrap();
        assert_eq!(event.text(), "y");
        assert_eq!(event.state(), None);
    }

    #[test]
    fn test_frame_error_into_event() {
        let err = serde_json::from_str::<RawPayload>("nope").unwrap_err();
        let event = ChatEvent::from(FrameError::Malformed(err));
        assert!(matches!(event, ChatEvent::StreamError { ref message } if message.starts_with("malformed frame")));
        assert_eq!(event.text(), "");
    }

    #[test]
    fn test_mistyped_page_keeps_content() {
        let frame = r#"{"content":"Hi","state":{"sources":[{"file_name":"a.pdf","page":1.0}]}}"#;
        let event = interpret(frame, DATA_PREFIX).unwrap().unwrap();
        assert_eq!(event.text(), "Hi");
        let sources = event.state().and_then(|s| s.sources.as_ref()).unwrap();
        assert_eq!(sources[0].page, Some(1));
    }

    #[test]
    fn test_unreadable_state_keeps_content() {
        let frame = r#"data: {"content":"Hi","state":{"followUpQuestions":"not a list"}}"#;
        assert_eq!(
            interpret(frame, DATA_PREFIX).unwrap(),
            Some(ChatEvent::ContentDelta {
                text: "Hi".to_string(),
                state: None
            })
        );
    }
}
