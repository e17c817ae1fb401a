use std::error::Error as StdError;
use std::fmt;

use crate::producer::ProducerError;

pub type Result<T> = core::result::Result<T, Error>;

/// Terminal, stream-local failures. Each variant aborts only the stream
/// that raised it; other in-flight streams are unaffected.
///
/// Producer exhaustion and consumer disconnects are not errors; the
/// driver reports those as a [`crate::StreamOutcome`].
#[derive(Debug)]
pub enum Error {
    /// An event payload could not be serialized. The stream is aborted
    /// before any malformed frame is written; this indicates an
    /// integration bug and is not retried.
    Encoding(serde_json::Error),
    /// A generation backend behind the producer seam failed mid-stream.
    Producer(ProducerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Encoding(e) => write!(f, "event failed to encode: {e}"),
            Error::Producer(e) => write!(f, "producer failed: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Encoding(e) => Some(e),
            Error::Producer(e) => Some(&**e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err)
    }
}
