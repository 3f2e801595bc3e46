use mcp_stream_server::{build_app, config::Config, logging, mcp::McpServer, tools, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let mut server = McpServer::new(
        config.server_name.clone(),
        config.server_version.clone(),
        config.server_description.clone(),
    );
    server.set_debug(config.debug);
    tools::register_all(&mut server)?;

    let tool_count = server.tools().len();
    let debug_enabled = server.is_debug();
    let state = AppState::new(server);
    let app = build_app(state);
    let bind_socket = config.bind_socket()?;
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        server = %config.server_name,
        tools = tool_count,
        debug = debug_enabled,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
