//! JSON-RPC 2.0 envelope construction
//!
//! Replies carry the request id and either a `result` or an `error`; progress
//! notifications carry no id. Every application-level failure is reported with
//! the single reserved code [`ERR_UNKNOWN`].

use rust_mcp_sdk::schema::{JsonrpcErrorResponse, RequestId, RpcError};
use serde::Serialize;
use serde_json::{json, Value};

use crate::mcp::types::ToolFailure;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROGRESS_METHOD: &str = "notifications/progress";

/// Reserved server-error code used for tool-not-found and handler failures.
pub const ERR_UNKNOWN: i64 = -32001;

/// Successful replies are kept untyped: a result may be any JSON value,
/// including the bare arrays some legacy handlers return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResult {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Success(JsonRpcResult),
    Failure(JsonrpcErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: ProgressParams,
}

/// Position of one streamed item within its sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub token: Option<Value>,
    pub progress: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressParams {
    pub stream_id: String,
    pub content: Value,
    pub progress_token: Option<Value>,
    pub progress: usize,
    pub total: usize,
}

pub fn reply_result(id: i64, result: Value) -> JsonRpcReply {
    JsonRpcReply::Success(JsonRpcResult {
        jsonrpc: JSONRPC_VERSION,
        id,
        result,
    })
}

/// The attempted content, if any, travels in `error.data.content`.
pub fn reply_failure(id: i64, failure: ToolFailure) -> JsonRpcReply {
    JsonRpcReply::Failure(JsonrpcErrorResponse::new(
        RpcError {
            code: ERR_UNKNOWN,
            data: Some(json!({ "content": failure.content })),
            message: failure.message,
        },
        Some(RequestId::Integer(id)),
    ))
}

pub fn progress_notification(
    stream_id: &str,
    content: Value,
    info: ProgressInfo,
) -> JsonRpcNotification {
    JsonRpcNotification {
        jsonrpc: JSONRPC_VERSION,
        method: PROGRESS_METHOD,
        params: ProgressParams {
            stream_id: stream_id.to_string(),
            content,
            progress_token: info.token,
            progress: info.progress,
            total: info.total,
        },
    }
}

/// Wraps a tool result as `{content:[{type:text,text}], structuredContent}` so
/// text-only and structured clients both read the same payload.
pub fn wrap_tool_content(value: Value) -> Result<Value, serde_json::Error> {
    let text = serde_json::to_string(&value)?;
    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": value
    }))
}
