//! HTTP side of the MCP transport: CORS, streaming headers and the response body
//!
//! Tool handlers are synchronous, so each request is served on the blocking
//! pool and its frames are pushed through a bounded channel that backs the
//! response body. Frames reach the client as soon as they are produced.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use crate::mcp::envelope::{RequestContext, RequestParams};
use crate::mcp::stream::{EventSink, StreamError};
use crate::mcp::{McpServer, TransportContext};

pub const EVENT_STREAM: &str = "text/event-stream";

const FRAME_BUFFER: usize = 16;

pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub fn apply_stream_headers(headers: &mut HeaderMap) {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
}

/// Stamps the permissive CORS headers on every response, whatever its status.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

/// Sink that forwards frames into the response body channel.
pub struct ChannelSink {
    sender: mpsc::Sender<Result<Bytes, StreamError>>,
    delivered: usize,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<Result<Bytes, StreamError>>) -> Self {
        Self {
            sender,
            delivered: 0,
        }
    }

    /// Frames accepted by the body channel so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Pushes an error into the body, which makes the server drop the connection
    /// instead of ending the stream cleanly.
    pub fn abort(self, err: StreamError) {
        let _ = self.sender.blocking_send(Err(err));
    }
}

impl EventSink for ChannelSink {
    fn send(&mut self, frame: Bytes) -> Result<(), StreamError> {
        self.sender
            .blocking_send(Ok(frame))
            .map_err(|_| StreamError::Closed)?;
        self.delivered += 1;
        Ok(())
    }
}

/// Starts serving the request in the background and returns the body that
/// streams its frames.
pub fn event_stream(
    server: Arc<McpServer>,
    transport: TransportContext,
    context: RequestContext,
    params: RequestParams,
) -> Body {
    let (sender, receiver) = mpsc::channel(FRAME_BUFFER);

    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink::new(sender);
        let result = server.serve(&transport, &context, params, &mut sink);
        let frames = sink.delivered();
        match result {
            Ok(_) => info!(
                method = %context.method,
                id = context.request_id,
                frames,
                status = "complete",
                "event stream summary"
            ),
            Err(StreamError::Closed) => warn!(
                method = %context.method,
                id = context.request_id,
                frames,
                status = "client_closed",
                "event stream summary"
            ),
            Err(err) => {
                error!(
                    method = %context.method,
                    id = context.request_id,
                    frames,
                    status = "aborted",
                    error = %err,
                    "event stream summary"
                );
                sink.abort(err);
            }
        }
    });

    Body::from_stream(ReceiverStream::new(receiver))
}

#[cfg(test)]
mod tests {
    use axum::http::Response;
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn cors_headers_are_permissive() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
    }

    #[test]
    fn stream_headers_disable_caching() {
        let mut response = Response::new(());
        apply_stream_headers(response.headers_mut());

        assert_eq!(response.headers()[header::CONTENT_TYPE], EVENT_STREAM);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");
    }

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let mut sink = ChannelSink::new(sender);

        let err = sink
            .send(Bytes::from_static(b"data: {}\n\n"))
            .expect_err("receiver is gone");
        assert!(matches!(err, StreamError::Closed));
    }

    #[test]
    fn channel_sink_counts_delivered_frames() {
        let (sender, _receiver) = mpsc::channel(4);
        let mut sink = ChannelSink::new(sender);

        sink.send(Bytes::from_static(b"data: 1\n\n")).expect("first");
        sink.send(Bytes::from_static(b"data: 2\n\n")).expect("second");
        assert_eq!(sink.delivered(), 2);
    }

    #[tokio::test]
    async fn abort_fails_the_body_after_delivered_frames() {
        let (sender, receiver) = mpsc::channel(FRAME_BUFFER);
        let mut body = Body::from_stream(ReceiverStream::new(receiver));

        tokio::task::spawn_blocking(move || {
            let mut sink = ChannelSink::new(sender);
            sink.send(Bytes::from_static(b"data: {\"id\":1}\n\n"))
                .expect("first frame");
            sink.abort(StreamError::Response(
                serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json"),
            ));
        })
        .await
        .expect("producer task");

        let first = body
            .frame()
            .await
            .expect("first frame present")
            .expect("first frame ok")
            .into_data()
            .expect("data frame");
        assert_eq!(first, Bytes::from_static(b"data: {\"id\":1}\n\n"));

        let aborted = body.frame().await.expect("abort reaches the body");
        assert!(aborted.is_err());
    }

    #[tokio::test]
    async fn aborted_body_cannot_be_collected() {
        let (sender, receiver) = mpsc::channel(FRAME_BUFFER);
        let body = Body::from_stream(ReceiverStream::new(receiver));

        tokio::task::spawn_blocking(move || {
            let mut sink = ChannelSink::new(sender);
            sink.send(Bytes::from_static(b"data: {}\n\n")).expect("first frame");
            sink.abort(StreamError::Closed);
        })
        .await
        .expect("producer task");

        assert!(body.collect().await.is_err());
    }
}
