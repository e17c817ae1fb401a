use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// One decoded frame payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedEvent {
    pub id: u64,
    pub event: String,
    pub data: Value,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Background SSE reader for GET endpoints.
pub struct Connection {
    event_rx: mpsc::UnboundedReceiver<ReceivedEvent>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub fn establish(url: &str) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(url)?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => {
                        match serde_json::from_str::<ReceivedEvent>(&event.data) {
                            Ok(received) => {
                                if tx.send(received).is_err() {
                                    debug!("SSE receiver dropped");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Undecodable frame payload: {e}");
                            }
                        }
                    }
                    Some(Ok(es::SSE::Comment(_))) => {
                        // Ignore comments (keep-alive)
                    }
                    Some(Err(e)) => {
                        debug!("SSE stream closed: {e}");
                        break;
                    }
                    None => {
                        debug!("SSE stream ended");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            event_rx: rx,
            _handle: handle,
        })
    }

    /// Collects events until the stream goes quiet, ends, or `limit`
    /// events have arrived.
    pub async fn collect(&mut self, limit: usize, idle_timeout: Duration) -> Vec<ReceivedEvent> {
        let mut events = Vec::new();
        while events.len() < limit {
            match tokio::time::timeout(idle_timeout, self.event_rx.recv()).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) | Err(_) => break,
            }
        }
        events
    }
}

/// POSTs a prompt to `/process` and decodes the `data:`-framed response
/// body until the server closes it.
pub async fn post_and_collect(
    base_url: &str,
    prompt: &str,
    max_tokens: u32,
) -> Result<Vec<ReceivedEvent>> {
    let response = reqwest::Client::new()
        .post(format!("{base_url}/process"))
        .json(&serde_json::json!({"prompt": prompt, "max_tokens": max_tokens}))
        .send()
        .await?
        .error_for_status()?;

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    anyhow::ensure!(
        content_type.starts_with("text/event-stream"),
        "unexpected content type: {content_type}"
    );

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut events = Vec::new();

    while let Some(chunk) = stream.next().await {
        buffer.push_str(std::str::from_utf8(&chunk?)?);

        while let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            let payload = frame
                .strip_prefix("data: ")
                .and_then(|rest| rest.strip_suffix("\n\n"))
                .ok_or_else(|| anyhow::anyhow!("malformed frame: {frame:?}"))?;
            events.push(serde_json::from_str(payload)?);
        }
    }

    anyhow::ensure!(buffer.is_empty(), "trailing partial frame: {buffer:?}");
    Ok(events)
}
