//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::http::transport::{apply_stream_headers, event_stream};
use crate::mcp::envelope::{parse_request, McpRequest, RequestContext};
use crate::mcp::TransportContext;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub mcp_endpoint: &'static str,
    pub tools: usize,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// CORS preflight for the metadata routes; the middleware adds the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    let info = state.server.info();
    Json(DiscoveryResponse {
        name: info.name.clone(),
        version: info.version.clone(),
        description: info.description.clone(),
        mcp_endpoint: "/mcp",
        tools: state.server.tools().len(),
    })
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = if method == Method::OPTIONS {
        McpRequest::default()
    } else {
        parse_request(&body)?
    };

    let context = RequestContext::resolve(&method, &request);
    if context.is_preflight {
        return Ok(StatusCode::OK.into_response());
    }

    let transport = TransportContext::new(method, uri, headers);
    let body = event_stream(state.server.clone(), transport, context, request.params);

    let mut response = Response::new(body);
    apply_stream_headers(response.headers_mut());
    Ok(response)
}
