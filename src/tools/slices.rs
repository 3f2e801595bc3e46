//! Example tools returning a sequence, to exercise streamed responses

use serde::Serialize;
use serde_json::{json, Value};

use crate::mcp::{
    Arguments, McpServer, RegistryError, ToolDescriptor, ToolFailure, ToolOutput,
    TransportContext,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleItem {
    pub id: u32,
    pub name: &'static str,
}

pub fn example_items() -> Vec<ExampleItem> {
    vec![
        ExampleItem { id: 1, name: "first item" },
        ExampleItem { id: 2, name: "second item" },
        ExampleItem { id: 3, name: "third item" },
    ]
}

fn example_slice_handler(
    _transport: &TransportContext,
    _arguments: &Arguments,
) -> Result<ToolOutput, ToolFailure> {
    ToolOutput::sequence(example_items())
}

fn item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "name": { "type": "string" }
        },
        "required": ["id", "name"]
    })
}

pub fn register(server: &mut McpServer) -> Result<(), RegistryError> {
    server.register_tool(
        ToolDescriptor::new(
            "example_slice",
            "An example tool that returns a slice of items to demonstrate streaming.",
            example_slice_handler,
        )
        .with_input_schema(json!({ "type": "object" }))
        .with_output_schema(json!({
            "type": "object",
            "oneOf": [
                { "type": "object", "properties": { "items": { "type": "array", "items": item_schema() } } },
                item_schema()
            ]
        }))
        .raw(),
    )?;

    server.register_tool(
        ToolDescriptor::new(
            "standard_slice_tool",
            "An example tool that returns a slice of items to demonstrate standard streaming.",
            example_slice_handler,
        )
        .with_input_schema(json!({ "type": "object" }))
        .with_output_schema(json!({
            "type": "object",
            "properties": {
                "items": { "type": "array", "items": item_schema() }
            }
        })),
    )
}
