use std::convert::Infallible;

use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::params::process::ProcessParams;
use crate::{AppState, Error};
use sse::driver::{ChannelSink, StreamDriver, StreamOutcome};
use sse::producer::{CountdownProducer, Producer, PromptProducer};

/// GET a countdown stream of paced `message` events
#[utoipa::path(
    get,
    path = "/stream",
    responses(
        (status = 200, description = "SSE stream of 10 message events, one per interval", content_type = "text/event-stream", body = String),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn stream(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET Establish a new countdown stream");

    let producer = CountdownProducer::new(app_state.config.message_interval());
    start_stream(&app_state, producer)
}

/// POST process a prompt into a paced stream of `token` events
#[utoipa::path(
    post,
    path = "/process",
    request_body = ProcessParams,
    responses(
        (status = 200, description = "SSE stream of max_tokens token events derived from the prompt", content_type = "text/event-stream", body = String),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn process(
    State(app_state): State<AppState>,
    Json(params): Json<ProcessParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Process a new prompt: {params:?}");

    let producer = PromptProducer::new(
        params.prompt,
        params.max_tokens,
        app_state.config.token_interval(),
    );
    start_stream(&app_state, producer)
}

/// Spawns one driver task for this request and returns its frames as a
/// long-lived `text/event-stream` body. The stream ends when the
/// producer is exhausted or the client goes away; no end-of-stream
/// sentinel is written.
fn start_stream<P>(app_state: &AppState, producer: P) -> Result<Response, Error>
where
    P: Producer + Sync + 'static,
{
    let permit = app_state
        .try_acquire_stream()
        .map_err(|_| Error::CapacityExhausted)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let mut driver = StreamDriver::new(producer, ChannelSink::new(tx), cancel.clone());
    if let Some(max) = app_state.config.max_stream_duration() {
        driver = driver.with_max_duration(max);
    }

    let stream_id = driver.id().clone();
    info!("Starting stream {stream_id}");

    tokio::spawn(async move {
        // Holds the capacity permit for the life of the stream.
        let _permit = permit;
        match driver.run().await {
            Ok(StreamOutcome::Completed { frames }) => {
                info!("Stream {stream_id} completed with {frames} frame(s)");
            }
            Ok(StreamOutcome::Cancelled { frames }) => {
                info!("Stream {stream_id} cancelled after {frames} frame(s)");
            }
            Err(e) => {
                error!("Stream {stream_id} aborted: {e}");
            }
        }
    });

    // Hyper drops the body when the client disconnects; dropping the
    // guard cancels the driver without waiting out its pacing delay.
    let guard = cancel.drop_guard();
    let body = Body::from_stream(stream! {
        let _guard = guard;
        while let Some(frame) = rx.recv().await {
            yield Ok::<_, Infallible>(frame);
        }
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use clap::Parser;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use service::config::Config;
    use service::AppState;
    use tower::util::ServiceExt;

    /// Test state with millisecond pacing so collecting a whole stream
    /// stays fast.
    fn test_state(extra_args: &[&str]) -> AppState {
        let mut argv = vec![
            "tokenstream_rs",
            "--token-interval-ms",
            "1",
            "--message-interval-ms",
            "1",
        ];
        argv.extend_from_slice(extra_args);
        AppState::new(Config::parse_from(argv))
    }

    /// Splits a collected SSE body into its per-frame JSON payloads.
    fn frames(body: &[u8]) -> Vec<Value> {
        let text = std::str::from_utf8(body).unwrap();
        let mut frames = Vec::new();
        for chunk in text.split_terminator("\n\n") {
            let json = chunk.strip_prefix("data: ").expect("data-prefixed frame");
            frames.push(serde_json::from_str(json).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn countdown_stream_emits_ten_messages_in_order() {
        let router = define_routes(test_state(&[]));
        let response = router
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let frames = frames(&body);

        assert_eq!(frames.len(), 10);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(
                *frame,
                json!({
                    "id": i as u64,
                    "event": "message",
                    "data": format!("This is message {}", i + 1),
                })
            );
        }
    }

    #[tokio::test]
    async fn process_streams_tokens_with_the_prompt_echoed() {
        let router = define_routes(test_state(&[]));
        let request = Request::post("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"prompt": "hi", "max_tokens": 3}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let frames = frames(&body);

        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(
                *frame,
                json!({
                    "id": i as u64,
                    "event": "token",
                    "data": format!("token_{i}"),
                    "prompt": "hi",
                })
            );
        }
    }

    #[tokio::test]
    async fn zero_max_tokens_closes_the_stream_with_no_frames() {
        let router = define_routes(test_state(&[]));
        let request = Request::post("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"prompt": "x", "max_tokens": 0}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn malformed_process_body_is_rejected_before_a_stream_starts() {
        let router = define_routes(test_state(&[]));
        let request = Request::post("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"max_tokens": 3}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn capacity_limit_rejects_streams_up_front() {
        let router = define_routes(test_state(&["--max-concurrent-streams", "0"]));
        let response = router
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_and_welcome_endpoints_respond() {
        let router = define_routes(test_state(&[]));

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let welcome = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(welcome.status(), StatusCode::OK);
        let body = welcome.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"message": "Welcome to SSE API"}));
    }
}
