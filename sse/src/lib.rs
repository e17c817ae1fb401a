//! Server-Sent Events (SSE) streaming pipeline.
//!
//! This crate implements the production side of a paced SSE response:
//! a bounded producer yields events on its own schedule, an encoder turns
//! each event into one wire frame, and a driver writes frames to the
//! consumer while honoring pacing and cancellation.
//!
//! # Architecture
//!
//! - **One stream per request**: each stream exclusively owns one producer
//!   and one output sink. There is no cross-stream state and no broadcast;
//!   a failure in one stream never affects another.
//! - **Paced emission**: producers report the interval to wait after each
//!   event. The driver realizes the wait as a non-blocking suspension, so
//!   a slow stream never occupies a worker thread.
//! - **Atomic frames**: a frame is either fully handed to the sink or not
//!   produced at all. Cancellation interrupts the pacing wait, never a
//!   partially written frame.
//! - **Transport-agnostic core**: the driver writes to a [`driver::FrameSink`];
//!   the HTTP layer supplies a channel-backed sink and owns the response
//!   lifecycle.
//!
//! # Modules
//!
//! - `event`: the event record and its wire JSON shape
//! - `producer`: the producer contract and the built-in countdown/prompt variants
//! - `encoder`: event-to-frame serialization
//! - `driver`: the per-stream orchestration loop
//! - `error`: terminal, stream-local failures

pub mod driver;
pub mod encoder;
pub mod error;
pub mod event;
pub mod producer;

pub use driver::{StreamDriver, StreamOutcome};
