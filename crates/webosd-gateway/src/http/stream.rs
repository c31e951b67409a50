//! `GET /es` — the Server-Sent Events stream.
//!
//! Each connection owns one [`Subscription`]. The response body pulls from
//! its mailbox and writes every event in wire format; when the client goes
//! away hyper drops the body, which drops the subscription and releases the
//! slot in the coordinator.

use std::io;
use std::sync::Arc;

use async_stream::stream;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderName, Method, StatusCode, Version},
    response::{IntoResponse, Response},
};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use webosd_eventsource::{encode, EventSourceError, SubscriberId, Subscription};

use crate::app::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// GET /es
///
/// 405 for anything but GET (HEAD included), 400 when the connection cannot
/// stream (HTTP/1.0 and older have no chunked framing), 503 once the
/// coordinator has stopped. None of those register a subscriber.
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    version: Version,
) -> Response {
    // the router's `get` also routes HEAD here
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    if version < Version::HTTP_11 {
        return (StatusCode::BAD_REQUEST, "Streaming events not supported").into_response();
    }

    let sub = match state.events.subscribe().await {
        Ok(sub) => sub,
        Err(e) => {
            warn!(error = %e, "rejecting event stream");
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };
    info!(subscriber = %sub.id(), "event stream opened");

    let body = Body::from_stream(event_stream(sub, state.shutdown.clone()));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
        .into_response()
}

/// Logs the end of a stream however it ends, including client disconnects
/// where the body is simply dropped mid-await.
struct StreamGuard {
    id: SubscriberId,
    sent: u64,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        info!(subscriber = %self.id, sent = self.sent, "event stream closed");
    }
}

fn event_stream(
    mut sub: Subscription,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    stream! {
        let mut guard = StreamGuard { id: sub.id(), sent: 0 };
        loop {
            let next = tokio::select! {
                event = sub.recv() => event,
                _ = shutdown.cancelled() => None,
            };
            // mailbox closed: dropped as slow, or the coordinator stopped
            let Some(event) = next else { break };

            match encode(event.as_ref()).map_err(EventSourceError::from) {
                Ok(bytes) => {
                    guard.sent += 1;
                    yield Ok::<_, io::Error>(Bytes::from(bytes));
                }
                Err(e) => {
                    warn!(subscriber = %guard.id, error = %e, "event encoding failed, closing stream");
                    break;
                }
            }
        }
        sub.unsubscribe();
    }
}
