//! Tools bundled with the server binary
//!
//! The MCP core treats these as ordinary collaborators registered at startup.

pub mod clock;
pub mod slices;

use std::sync::Arc;

use crate::mcp::{McpServer, RegistryError};

pub fn register_all(server: &mut McpServer) -> Result<(), RegistryError> {
    clock::register(server, Arc::new(clock::SystemClock))?;
    slices::register(server)
}
