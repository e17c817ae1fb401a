use std::time::Duration;

use serde_json::json;

use crate::event::{EventKind, StreamEvent};

/// Opaque failure surfaced by a generation backend plugged in behind the
/// [`Producer`] seam.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of polling a producer for its next item.
#[derive(Debug)]
pub enum Step {
    /// The next event, plus the pacing interval the caller should wait
    /// before polling again. Production is throttled, not instantaneous.
    Emit(StreamEvent, Duration),
    /// The producer is exhausted; every later poll returns `Done` again.
    Done,
}

/// A bounded, paced source of stream events.
///
/// Producers move through `Idle -> Emitting -> Exhausted`; each poll
/// either emits the next event (assigning it the next sequence id) or
/// reports exhaustion. A bound of zero is valid and yields `Done` on the
/// first poll.
///
/// The built-in producers never fail. The fallible return exists so a
/// real generation backend behind the same trait can surface its errors;
/// the stream driver maps them to a terminal stream error.
pub trait Producer: Send {
    fn next(&mut self) -> Result<Step, ProducerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Emitting,
    Exhausted,
}

/// Emits a fixed number of numbered `message` events at a fixed interval.
///
/// The demo stream behind `GET /stream`: ten events, one per interval,
/// no prompt context.
pub struct CountdownProducer {
    emitted: u64,
    interval: Duration,
    state: State,
}

impl CountdownProducer {
    /// Number of messages the countdown stream emits.
    pub const EVENT_COUNT: u64 = 10;

    pub fn new(interval: Duration) -> Self {
        Self {
            emitted: 0,
            interval,
            state: State::Idle,
        }
    }
}

impl Producer for CountdownProducer {
    fn next(&mut self) -> Result<Step, ProducerError> {
        match self.state {
            State::Exhausted => Ok(Step::Done),
            State::Idle | State::Emitting => {
                if self.emitted == Self::EVENT_COUNT {
                    self.state = State::Exhausted;
                    return Ok(Step::Done);
                }
                self.state = State::Emitting;
                let event = StreamEvent {
                    id: self.emitted,
                    kind: EventKind::Message,
                    data: json!(format!("This is message {}", self.emitted + 1)),
                    prompt: None,
                };
                self.emitted += 1;
                Ok(Step::Emit(event, self.interval))
            }
        }
    }
}

/// Emits `max_tokens` placeholder `token` events derived from a prompt,
/// echoing the prompt on every event.
///
/// Stands in for a real generation backend; swapping one in means
/// implementing [`Producer`] over its output and changing the
/// construction site, nothing downstream.
pub struct PromptProducer {
    prompt: String,
    emitted: u64,
    limit: u64,
    interval: Duration,
    state: State,
}

impl PromptProducer {
    pub fn new(prompt: String, max_tokens: u32, interval: Duration) -> Self {
        Self {
            prompt,
            emitted: 0,
            limit: u64::from(max_tokens),
            interval,
            state: State::Idle,
        }
    }
}

impl Producer for PromptProducer {
    fn next(&mut self) -> Result<Step, ProducerError> {
        match self.state {
            State::Exhausted => Ok(Step::Done),
            State::Idle | State::Emitting => {
                if self.emitted == self.limit {
                    self.state = State::Exhausted;
                    return Ok(Step::Done);
                }
                self.state = State::Emitting;
                let event = StreamEvent {
                    id: self.emitted,
                    kind: EventKind::Token,
                    data: json!(format!("token_{}", self.emitted)),
                    prompt: Some(self.prompt.clone()),
                };
                self.emitted += 1;
                Ok(Step::Emit(event, self.interval))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const INTERVAL: Duration = Duration::from_millis(5);

    fn drain(producer: &mut dyn Producer) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        loop {
            match producer.next().unwrap() {
                Step::Emit(event, delay) => {
                    assert_eq!(delay, INTERVAL);
                    events.push(event);
                }
                Step::Done => return events,
            }
        }
    }

    #[test]
    fn countdown_emits_ten_numbered_messages() {
        let mut producer = CountdownProducer::new(INTERVAL);
        let events = drain(&mut producer);

        assert_eq!(events.len(), 10);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.id, i as u64);
            assert_eq!(event.kind, EventKind::Message);
            assert_eq!(event.data, json!(format!("This is message {}", i + 1)));
            assert_eq!(event.prompt, None);
        }
    }

    #[test]
    fn exhaustion_is_terminal() {
        let mut producer = CountdownProducer::new(INTERVAL);
        drain(&mut producer);

        for _ in 0..3 {
            assert!(matches!(producer.next().unwrap(), Step::Done));
        }
    }

    #[test]
    fn prompt_producer_respects_bound_and_echoes_prompt() {
        let mut producer = PromptProducer::new("hi".to_string(), 3, INTERVAL);
        let events = drain(&mut producer);

        assert_eq!(events.len(), 3);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.id, i as u64);
            assert_eq!(event.kind, EventKind::Token);
            assert_eq!(event.data, json!(format!("token_{i}")));
            assert_eq!(event.prompt.as_deref(), Some("hi"));
        }
    }

    #[test]
    fn zero_bound_is_done_on_first_poll() {
        let mut producer = PromptProducer::new("x".to_string(), 0, INTERVAL);
        assert!(matches!(producer.next().unwrap(), Step::Done));
        assert!(matches!(producer.next().unwrap(), Step::Done));
    }
}
