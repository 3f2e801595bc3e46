//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides envelope parsing, the tool registry, method dispatch, reply
//! formatting and the streaming encoder for sequence-valued tool results.

pub mod envelope;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod stream;
pub mod types;

pub use envelope::{McpRequest, RequestContext};
pub use registry::{RegistryError, ToolRegistry};
pub use server::McpServer;
pub use types::{Arguments, ToolDescriptor, ToolFailure, ToolOutput, TransportContext};
