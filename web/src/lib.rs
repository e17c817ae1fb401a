//! HTTP transport layer for the streaming API.
//!
//! Controllers select a producer variant per request, hand it to a
//! stream driver, and expose the driver's frames as a long-lived
//! `text/event-stream` response body. Everything stream-shaped lives in
//! the `sse` crate; this crate only adapts it to axum.

mod controller;
pub mod error;
pub mod params;
pub mod router;

pub use error::{Error, Result};
pub use service::AppState;
