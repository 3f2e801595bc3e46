//! Ordered, append-only collection of tool descriptors
//!
//! Registration happens during setup; afterwards the registry is only read, so it
//! can be shared between concurrent requests without locking.

use thiserror::Error;

use crate::mcp::types::ToolDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tool. Names are unique keys, so a second tool with a known name is rejected.
    pub fn register(&mut self, tool: ToolDescriptor) -> Result<(), RegistryError> {
        if self.find(&tool.name).is_some() {
            return Err(RegistryError::DuplicateTool(tool.name));
        }

        self.tools.push(tool);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Tools in registration order; this order is what `tools/list` reports.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
