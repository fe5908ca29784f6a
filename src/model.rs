//! Wire data model for chat stream frames.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A document the assistant drew on for its answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Source {
    /// Originating file. The server sends `null` when the document has no source metadata.
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Page number. Integral floats and numeric strings are accepted; anything else reads as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_page",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<u32>,

    /// Retrieval score
    #[serde(
        default,
        deserialize_with = "lenient_relevance",
        skip_serializing_if = "Option::is_none"
    )]
    pub relevance: Option<f64>,
}

/// Out-of-band state snapshot sent alongside or between content deltas.
///
/// An empty object is a valid snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,

    #[serde(
        rename = "followUpQuestions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_questions: Option<Vec<String>>,
}

impl ChatState {
    /// Snapshot carrying only follow-up questions.
    pub fn with_follow_ups(questions: Vec<String>) -> Self {
        Self {
            sources: None,
            follow_up_questions: Some(questions),
        }
    }

    /// Whether the snapshot carries neither sources nor follow-up questions.
    pub fn is_empty(&self) -> bool {
        self.sources.is_none() && self.follow_up_questions.is_none()
    }
}

/// Raw frame payload as it appears on the wire.
///
/// Every field is optional and `null` counts as absent.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPayload {
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub content: Option<String>,

    /// Kept untyped so a state that fails to convert cannot take the content down with it.
    #[serde(default)]
    pub state: Option<Value>,
}

/// Classified frame payload.
///
/// The variants follow the priority order error, content, state: an error
/// field wins over everything else, and content wins over a bare state.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Error(String),
    Content {
        content: String,
        state: Option<ChatState>,
    },
    State(ChatState),
    Empty,
}

impl TryFrom<RawPayload> for Payload {
    type Error = serde_json::Error;

    /// Fails only for a state-only frame whose state does not convert. Next
    /// to content, a bad state is logged and dropped.
    fn try_from(raw: RawPayload) -> Result<Self, <Payload as TryFrom<RawPayload>>::Error> {
        match raw {
            RawPayload {
                error: Some(error), ..
            } => Ok(Payload::Error(error_message(error))),
            RawPayload {
                content: Some(content),
                state,
                ..
            } => {
                let state = state.and_then(|value| match serde_json::from_value(value) {
                    Ok(state) => Some(state),
                    Err(err) => {
                        tracing::warn!(error = %err, "dropping unreadable state beside content");
                        None
                    }
                });
                Ok(Payload::Content { content, state })
            }
            RawPayload {
                state: Some(state), ..
            } => Ok(Payload::State(serde_json::from_value(state)?)),
            RawPayload { .. } => Ok(Payload::Empty),
        }
    }
}

fn error_message(error: Value) -> String {
    match error {
        Value::String(message) => message,
        other => other.to_string(),
    }
}

fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_relevance<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
