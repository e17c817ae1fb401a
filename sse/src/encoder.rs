use crate::error::Result;
use crate::event::StreamEvent;

/// Encodes one event as one complete SSE frame:
///
/// ```text
/// data: <compact-json>\n\n
/// ```
///
/// Stateless: one event in, one frame out, nothing buffered across
/// calls. Newlines inside payloads are escaped by the JSON encoding, so
/// the frame body never contains a raw interior newline.
pub fn encode(event: &StreamEvent) -> Result<String> {
    let json = serde_json::to_string(event)?;
    Ok(format!("data: {json}\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use serde_json::{json, Value};

    fn token_event() -> StreamEvent {
        StreamEvent {
            id: 1,
            kind: EventKind::Token,
            data: json!("token_1"),
            prompt: Some("hi".to_string()),
        }
    }

    #[test]
    fn frame_is_data_prefixed_and_blank_line_terminated() {
        let frame = encode(&token_event()).unwrap();

        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));
        // The only newlines are the two terminators.
        assert_eq!(frame.matches('\n').count(), 2);
    }

    #[test]
    fn frame_json_carries_all_event_fields() {
        let frame = encode(&token_event()).unwrap();
        let json = frame
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .unwrap();

        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(
            value,
            json!({"id": 1, "event": "token", "data": "token_1", "prompt": "hi"})
        );
    }

    #[test]
    fn round_trips_through_the_frame() {
        let event = token_event();
        let frame = encode(&event).unwrap();
        let json = frame
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .unwrap();

        let decoded: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn payload_newlines_are_escaped_not_emitted_raw() {
        let event = StreamEvent {
            id: 0,
            kind: EventKind::Message,
            data: json!("line one\nline two"),
            prompt: None,
        };

        let frame = encode(&event).unwrap();
        assert_eq!(frame.matches('\n').count(), 2);
        assert!(frame.contains("line one\\nline two"));
    }
}
