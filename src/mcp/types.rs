//! Tool descriptors and the values flowing between the dispatcher and tool handlers

use std::{fmt, sync::Arc};

use axum::http::{HeaderMap, Method, Uri};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Argument mapping passed to tool handlers.
pub type Arguments = Map<String, Value>;

/// Signature shared by tool handlers and the fallback handler.
pub type ToolHandler =
    Arc<dyn Fn(&TransportContext, &Arguments) -> Result<ToolOutput, ToolFailure> + Send + Sync>;

/// The inbound HTTP request as seen by tool handlers.
#[derive(Debug, Clone)]
pub struct TransportContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl TransportContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Result of a tool handler: a single value, or a sequence that gets streamed.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl ToolOutput {
    pub fn scalar<T: Serialize>(value: T) -> Result<Self, ToolFailure> {
        serde_json::to_value(value)
            .map(Self::Scalar)
            .map_err(|err| ToolFailure::new(format!("failed to serialize tool result: {err}")))
    }

    pub fn sequence<T, I>(items: I) -> Result<Self, ToolFailure>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Sequence)
            .map_err(|err| ToolFailure::new(format!("failed to serialize tool result: {err}")))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::Sequence(items) => Value::Array(items),
        }
    }
}

/// A tool-level failure, optionally carrying whatever output was produced before it failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ToolFailure {
    pub message: String,
    pub content: Option<Value>,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            content: None,
        }
    }

    pub fn tool_not_found() -> Self {
        Self::new("tool not found")
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }
}

/// A callable capability. Serializes to its `tools/list` wire form; the handler
/// and the raw flag never leave the process.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(skip)]
    pub raw: bool,
    #[serde(skip)]
    handler: ToolHandler,
}

impl ToolDescriptor {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&TransportContext, &Arguments) -> Result<ToolOutput, ToolFailure>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({ "type": "object", "properties": {} }),
            output_schema: None,
            raw: false,
            handler: Arc::new(handler),
        }
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Sequence items of raw tools are streamed without the text/structured wrapping.
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn call(
        &self,
        transport: &TransportContext,
        arguments: &Arguments,
    ) -> Result<ToolOutput, ToolFailure> {
        (self.handler)(transport, arguments)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}
