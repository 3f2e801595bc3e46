use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod tools;

use mcp::McpServer;

/// Shared request state. The server is fully configured before it is wrapped,
/// so handlers only ever read it.
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
}

impl AppState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server: Arc::new(server),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", any(http::handlers::mcp_endpoint))
        .route("/mcp", any(http::handlers::mcp_endpoint))
        .route(
            "/health",
            get(http::handlers::health).options(http::handlers::preflight),
        )
        .route(
            "/.well-known/mcp",
            get(http::handlers::discovery).options(http::handlers::preflight),
        )
        .layer(middleware::from_fn(http::transport::cors_middleware))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
