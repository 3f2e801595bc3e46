//! The central Model Context Protocol engine
//!
//! Owns the server identity and tool registry, routes each request to
//! capability negotiation (`initialize`), tool listing, tool invocation or the
//! fallback handler, then hands the outcome to the streaming encoder.

use std::sync::Arc;

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities, ServerCapabilitiesTools,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::mcp::envelope::{RequestContext, RequestParams};
use crate::mcp::registry::{RegistryError, ToolRegistry};
use crate::mcp::stream::{encode_outcome, EventSink, Outcome, StreamError};
use crate::mcp::types::{
    Arguments, ToolDescriptor, ToolFailure, ToolHandler, ToolOutput, TransportContext,
};

pub const INITIALIZE: &str = "initialize";
pub const TOOLS_LIST: &str = "tools/list";
pub const TOOLS_CALL: &str = "tools/call";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
struct ListToolsResult<'a> {
    tools: &'a [ToolDescriptor],
}

pub struct McpServer {
    info: ServerInfo,
    registry: ToolRegistry,
    default_handler: Option<ToolHandler>,
    debug: bool,
}

impl McpServer {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
                description: description.into(),
            },
            registry: ToolRegistry::new(),
            default_handler: None,
            debug: false,
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        self.registry.list()
    }

    pub fn find_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.registry.find(name)
    }

    pub fn register_tool(&mut self, tool: ToolDescriptor) -> Result<(), RegistryError> {
        debug!(tool = %tool.name, raw = tool.raw, "registering tool");
        self.registry.register(tool)
    }

    pub fn set_default_handler<F>(&mut self, handler: F)
    where
        F: Fn(&TransportContext, &Arguments) -> Result<ToolOutput, ToolFailure>
            + Send
            + Sync
            + 'static,
    {
        self.default_handler = Some(Arc::new(handler));
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Serves one request start to finish, writing every frame into `sink`.
    pub fn serve(
        &self,
        transport: &TransportContext,
        context: &RequestContext,
        params: RequestParams,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StreamError> {
        if context.is_preflight {
            return Ok(0);
        }

        self.trace_request(transport, context, &params);
        let tool_name = params.name.clone();
        let outcome = self.dispatch(transport, context, params);

        info!(
            method = %context.method,
            id = context.request_id,
            tool = tool_name.as_deref().unwrap_or(""),
            outcome = if outcome.result.is_ok() { "success" } else { "failure" },
            "mcp action audited"
        );

        encode_outcome(context, outcome, sink)
    }

    pub fn dispatch(
        &self,
        transport: &TransportContext,
        context: &RequestContext,
        params: RequestParams,
    ) -> Outcome {
        match context.method.as_str() {
            INITIALIZE => Outcome {
                result: ToolOutput::scalar(self.initialize_result()),
                raw: false,
            },
            TOOLS_LIST => Outcome {
                result: ToolOutput::scalar(ListToolsResult {
                    tools: self.registry.list(),
                }),
                raw: false,
            },
            TOOLS_CALL => self.call_tool(transport, params),
            _ => Outcome {
                result: self.fallback(transport, &params.arguments),
                raw: false,
            },
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            server_info: Implementation {
                name: self.info.name.clone(),
                version: self.info.version.clone(),
                title: None,
                description: Some(self.info.description.clone()),
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::V2025_03_26.into(),
            instructions: None,
            meta: None,
        }
    }

    fn call_tool(&self, transport: &TransportContext, params: RequestParams) -> Outcome {
        let name = params.name.unwrap_or_default();
        let Some(tool) = self.registry.find(&name) else {
            warn!(tool = %name, "tool not found");
            return Outcome {
                result: Err(ToolFailure::tool_not_found()),
                raw: false,
            };
        };

        let result = tool.call(transport, &params.arguments);
        if let Err(failure) = &result {
            warn!(tool = %name, error = %failure, "tool call failed");
        }

        Outcome {
            result,
            raw: tool.raw,
        }
    }

    fn fallback(
        &self,
        transport: &TransportContext,
        arguments: &Arguments,
    ) -> Result<ToolOutput, ToolFailure> {
        match &self.default_handler {
            Some(handler) => handler(transport, arguments),
            None => {
                debug!("default handler not set");
                Ok(ToolOutput::Scalar(json!({ "status": "OK" })))
            }
        }
    }

    fn trace_request(
        &self,
        transport: &TransportContext,
        context: &RequestContext,
        params: &RequestParams,
    ) {
        let arguments = redact_audit_value(&Value::Object(params.arguments.clone()));
        let headers = redact_headers(transport);
        if self.debug {
            info!(
                method = %context.method,
                id = context.request_id,
                http_method = %transport.method,
                headers = %headers,
                arguments = %arguments,
                "mcp request"
            );
        } else {
            debug!(
                method = %context.method,
                id = context.request_id,
                arguments = %arguments,
                "mcp request"
            );
        }
    }
}

fn redact_headers(transport: &TransportContext) -> Value {
    let headers = transport
        .headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>").to_string();
            (name.as_str().to_string(), Value::String(value))
        })
        .collect();
    redact_audit_value(&Value::Object(headers))
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "cookie" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, Method, Uri};
    use bytes::Bytes;

    use super::*;
    use crate::mcp::envelope::{parse_request, McpRequest};
    use crate::mcp::rpc::ERR_UNKNOWN;

    fn transport() -> TransportContext {
        TransportContext::new(Method::POST, Uri::from_static("/mcp"), HeaderMap::new())
    }

    fn server() -> McpServer {
        let mut server = McpServer::new("test-server", "1.0", "Test Server");
        server
            .register_tool(ToolDescriptor::new("scalar", "Returns a map", |_, args| {
                Ok(ToolOutput::Scalar(json!({ "echo": args.get("value") })))
            }))
            .expect("register scalar");
        server
            .register_tool(
                ToolDescriptor::new("example_slice", "Returns three items", |_, _| {
                    ToolOutput::sequence([json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })])
                })
                .raw(),
            )
            .expect("register slice");
        server
            .register_tool(ToolDescriptor::new("broken", "Always fails", |_, _| {
                Err(ToolFailure::new("broken on purpose").with_content(json!({ "done": 1 })))
            }))
            .expect("register broken");
        server
    }

    fn serve(server: &McpServer, body: &str) -> Vec<Value> {
        let request: McpRequest = parse_request(body.as_bytes()).expect("envelope");
        let transport = transport();
        let context = RequestContext::resolve(&transport.method, &request);
        let mut frames: Vec<Bytes> = Vec::new();
        server
            .serve(&transport, &context, request.params, &mut frames)
            .expect("serve");

        frames
            .iter()
            .map(|frame| {
                let text = std::str::from_utf8(frame).expect("utf8");
                serde_json::from_str(text.trim_start_matches("data: ").trim_end())
                    .expect("json frame")
            })
            .collect()
    }

    #[test]
    fn initialize_returns_fixed_capabilities() {
        let messages = serve(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);

        assert_eq!(messages.len(), 1);
        let result = &messages[0]["result"];
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], "1.0");
        assert_eq!(result["serverInfo"]["description"], "Test Server");
    }

    #[test]
    fn tools_list_is_in_registration_order() {
        let server = server();
        for _ in 0..2 {
            let messages = serve(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
            let names: Vec<&str> = messages[0]["result"]["tools"]
                .as_array()
                .expect("tools array")
                .iter()
                .map(|tool| tool["name"].as_str().expect("name"))
                .collect();
            assert_eq!(names, ["scalar", "example_slice", "broken"]);
        }
    }

    #[test]
    fn tools_call_wraps_scalar_results() {
        let messages = serve(
            &server(),
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"scalar","arguments":{"value":5}}}"#,
        );

        assert_eq!(messages[0]["id"], 3);
        assert_eq!(messages[0]["result"]["structuredContent"], json!({ "echo": 5 }));
    }

    #[test]
    fn tools_call_streams_sequence_results() {
        let messages = serve(
            &server(),
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"example_slice","arguments":{}}}"#,
        );

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[3]["result"]["items"][2]["id"], 3);
    }

    #[test]
    fn unknown_tool_yields_error_reply() {
        let messages = serve(
            &server(),
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"missing_tool"}}"#,
        );

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["id"], 5);
        assert_eq!(messages[0]["error"]["code"], ERR_UNKNOWN);
        assert_eq!(messages[0]["error"]["message"], "tool not found");
    }

    #[test]
    fn handler_failure_carries_attempted_content() {
        let messages = serve(
            &server(),
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"broken"}}"#,
        );

        assert_eq!(messages[0]["error"]["message"], "broken on purpose");
        assert_eq!(messages[0]["error"]["data"]["content"], json!({ "done": 1 }));
    }

    #[test]
    fn unknown_method_without_default_handler_returns_ok_status() {
        let messages = serve(&server(), r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        assert_eq!(messages[0]["result"], json!({ "status": "OK" }));
    }

    #[test]
    fn missing_method_uses_default_handler_with_arguments() {
        let mut server = server();
        server.set_default_handler(|_, args| {
            Ok(ToolOutput::Scalar(json!({ "seen": args.len() })))
        });

        let messages = serve(&server, r#"{"params":{"arguments":{"a":1,"b":2}}}"#);
        assert_eq!(messages[0]["id"], 0);
        assert_eq!(messages[0]["result"], json!({ "seen": 2 }));
    }

    #[test]
    fn preflight_context_emits_nothing() {
        let server = server();
        let transport = TransportContext::new(Method::OPTIONS, Uri::from_static("/"), HeaderMap::new());
        let context = RequestContext::resolve(&transport.method, &McpRequest::default());
        let mut frames: Vec<Bytes> = Vec::new();

        let written = server
            .serve(&transport, &context, RequestParams::default(), &mut frames)
            .expect("serve");
        assert_eq!(written, 0);
        assert!(frames.is_empty());
    }

    #[test]
    fn redacts_sensitive_fields() {
        let redacted = redact_audit_value(&json!({
            "to": "ExponentPushToken[abc]",
            "expo_token": "should-not-appear",
            "nested": { "password": "should-not-appear", "title": "hi" }
        }));

        assert_eq!(redacted["to"], "ExponentPushToken[abc]");
        assert_eq!(redacted["expo_token"], "[REDACTED]");
        assert_eq!(redacted["nested"]["password"], "[REDACTED]");
        assert_eq!(redacted["nested"]["title"], "hi");
    }
}
