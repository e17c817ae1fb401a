use std::sync::Arc;

use log::info;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use config::Config;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns.
// Needs to implement Clone to be able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    stream_permits: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let stream_permits = config.max_concurrent_streams.map(|limit| {
            info!("Limiting concurrent streams to {limit}");
            Arc::new(Semaphore::new(limit))
        });

        Self {
            config,
            stream_permits,
        }
    }

    /// Reserves capacity for one new stream.
    ///
    /// Returns `Ok(None)` when no limit is configured, `Ok(Some(permit))`
    /// when capacity was reserved (the permit must be held for the life
    /// of the stream), and `Err` when the server is at capacity.
    pub fn try_acquire_stream(&self) -> Result<Option<OwnedSemaphorePermit>, TryAcquireError> {
        match &self.stream_permits {
            Some(permits) => permits.clone().try_acquire_owned().map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn state_with_limit(limit: Option<usize>) -> AppState {
        let mut config = Config::parse_from(["tokenstream_rs"]);
        config.max_concurrent_streams = limit;
        AppState::new(config)
    }

    #[test]
    fn unlimited_when_no_cap_is_configured() {
        let state = state_with_limit(None);
        for _ in 0..100 {
            assert!(matches!(state.try_acquire_stream(), Ok(None)));
        }
    }

    #[test]
    fn permits_free_up_when_a_stream_ends() {
        let state = state_with_limit(Some(1));

        let permit = state.try_acquire_stream().unwrap();
        assert!(permit.is_some());
        assert!(state.try_acquire_stream().is_err());

        drop(permit);
        assert!(state.try_acquire_stream().unwrap().is_some());
    }
}
