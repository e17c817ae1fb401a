use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::*;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::encoder;
use crate::error::Error;
use crate::producer::{Producer, Step};

/// Server-generated identifier for one stream, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returned by a sink write when the consumer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Destination for encoded frames.
///
/// A write either delivers the whole frame or reports the sink closed;
/// implementations must never deliver a partial frame.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> core::result::Result<(), SinkClosed>;
}

/// Channel-backed sink feeding an HTTP response body.
///
/// The receiving half lives inside the response body stream; when the
/// client disconnects the receiver is dropped and the next send reports
/// [`SinkClosed`].
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> core::result::Result<(), SinkClosed> {
        self.tx.send(frame).map_err(|_| SinkClosed)
    }
}

/// Terminal state of a stream, with the number of frames fully written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The producer ran to exhaustion and every frame reached the sink.
    Completed { frames: u64 },
    /// The consumer went away or the stream was cancelled mid-flight.
    /// The sink saw exactly `frames` complete frames and nothing after.
    Cancelled { frames: u64 },
}

/// Drives one producer into one sink: poll, encode, write, pace, repeat.
///
/// One driver runs per in-flight request. Frames go out in emission
/// order, each fully written before the pacing wait begins, so the sink
/// only ever observes whole frames in increasing id order.
pub struct StreamDriver<P, S> {
    id: StreamId,
    producer: P,
    sink: S,
    cancel: CancellationToken,
    deadline: Option<tokio::time::Instant>,
}

impl<P, S> StreamDriver<P, S>
where
    P: Producer,
    S: FrameSink,
{
    pub fn new(producer: P, sink: S, cancel: CancellationToken) -> Self {
        Self {
            id: StreamId::new(),
            producer,
            sink,
            cancel,
            deadline: None,
        }
    }

    /// Caps the stream's total lifetime. Reaching the deadline truncates
    /// the stream the same way a client disconnect does.
    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.deadline = Some(tokio::time::Instant::now() + max);
        self
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Runs the stream to a terminal state.
    ///
    /// Consumer disconnects (failed writes, cancellation) end the stream
    /// cleanly with [`StreamOutcome::Cancelled`]; no retry, no further
    /// producer polls. Encoding and producer failures abort the stream
    /// without writing a partial frame.
    pub async fn run(mut self) -> core::result::Result<StreamOutcome, Error> {
        let mut frames: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                debug!("stream {}: cancelled after {frames} frame(s)", self.id);
                return Ok(StreamOutcome::Cancelled { frames });
            }

            let step = match self.producer.next() {
                Ok(step) => step,
                Err(e) => {
                    error!(
                        "stream {}: producer failed after {frames} frame(s): {e}",
                        self.id
                    );
                    return Err(Error::Producer(e));
                }
            };

            match step {
                Step::Done => {
                    debug!("stream {}: producer exhausted, {frames} frame(s) written", self.id);
                    return Ok(StreamOutcome::Completed { frames });
                }
                Step::Emit(event, delay) => {
                    let frame = match encoder::encode(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            error!("stream {}: event {} failed to encode: {e}", self.id, event.id);
                            return Err(e);
                        }
                    };

                    if self.sink.send(frame).await.is_err() {
                        debug!(
                            "stream {}: consumer disconnected after {frames} frame(s)",
                            self.id
                        );
                        return Ok(StreamOutcome::Cancelled { frames });
                    }
                    frames += 1;

                    if !self.pace(delay).await {
                        debug!(
                            "stream {}: cancelled during pacing wait after {frames} frame(s)",
                            self.id
                        );
                        return Ok(StreamOutcome::Cancelled { frames });
                    }
                }
            }
        }
    }

    /// Waits out the producer's pacing interval. Returns `false` when the
    /// stream was cancelled (or hit its lifetime cap) during the wait;
    /// the wait is interrupted immediately, not run to completion.
    async fn pace(&self, delay: Duration) -> bool {
        let lifetime_cap = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = lifetime_cap => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
