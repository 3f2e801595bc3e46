//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing, CORS handling and the streamed response body.

pub mod handlers;
pub mod transport;
