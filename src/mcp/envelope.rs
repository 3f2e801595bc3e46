//! Inbound request envelope parsing and per-request context resolution

use axum::http::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::mcp::types::Arguments;

/// Method used when a legacy caller sends no method at all.
pub const FALLBACK_METHOD: &str = "response";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("request body is not a valid JSON-RPC envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Absent and `null` fields both take their default, as legacy callers send either.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct McpRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jsonrpc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: RequestParams,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arguments: Arguments,
    #[serde(default, rename = "_meta", deserialize_with = "null_as_default")]
    pub meta: RequestMeta,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_token: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a request body. An empty body is an empty legacy request.
pub fn parse_request(body: &[u8]) -> Result<McpRequest, EnvelopeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(McpRequest::default());
    }

    Ok(serde_json::from_slice(body)?)
}

/// Derived per-request state; never shared between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub request_id: i64,
    pub stream_id: Option<String>,
    pub progress_token: Option<Value>,
    pub is_preflight: bool,
}

impl RequestContext {
    pub fn resolve(http_method: &Method, request: &McpRequest) -> Self {
        if http_method == Method::OPTIONS {
            return Self {
                method: String::new(),
                request_id: request.id,
                stream_id: None,
                progress_token: None,
                is_preflight: true,
            };
        }

        let method = match request.method.trim() {
            "" => FALLBACK_METHOD.to_string(),
            method => method.to_string(),
        };

        Self {
            method,
            request_id: request.id,
            stream_id: request
                .params
                .meta
                .stream_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
            progress_token: request.params.meta.progress_token.clone(),
            is_preflight: false,
        }
    }
}
