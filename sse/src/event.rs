use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tells a consumer how to interpret an event's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Token,
    Message,
}

/// One unit of streamed output.
///
/// `id` is assigned by the producer at emission time; within one stream
/// ids are strictly increasing with no gaps, starting at 0.
///
/// Wire shape (one JSON object per frame):
/// `{"id": 0, "event": "token", "data": "token_0", "prompt": "..."}`
/// with `prompt` omitted entirely for context-free producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub id: u64,
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub data: Value,
    /// Caller-supplied correlation data echoed back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}
