use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = core::result::Result<T, Error>;

/// Request-level failures raised before a stream starts.
///
/// Failures inside an already-started stream cannot change the HTTP
/// status any more; the driver logs them and the body simply ends.
#[derive(Debug)]
pub enum Error {
    /// The configured concurrent-stream limit is exhausted.
    CapacityExhausted,
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> core::result::Result<(), fmt::Error> {
        write!(f, "{self:?}")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::CapacityExhausted => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE").into_response()
            }
        }
    }
}
