use std::{env, net::SocketAddr};

use thiserror::Error;

pub const DEFAULT_DESCRIPTION: &str = "MCP server exposing clock and streaming example tools";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub server_name: String,
    pub server_version: String,
    pub server_description: String,
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_DEBUG must be one of: 1, 0, true, false, yes, no, on, off")]
    InvalidDebugFlag,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_port = var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let debug = var("MCP_DEBUG")
            .map(|value| parse_flag(&value))
            .transpose()?
            .unwrap_or(false);

        let config = Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            bind_port,
            server_name: var("MCP_SERVER_NAME")
                .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            server_version: var("MCP_SERVER_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            server_description: var("MCP_SERVER_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            debug,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidDebugFlag),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = load(&[]).expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.server_name, env!("CARGO_PKG_NAME"));
        assert_eq!(config.server_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.server_description, DEFAULT_DESCRIPTION);
        assert!(!config.debug);
    }

    #[test]
    fn identity_and_debug_overrides() {
        let config = load(&[
            ("MCP_SERVER_NAME", "HourMCP"),
            ("MCP_SERVER_VERSION", "1.0.0"),
            ("MCP_SERVER_DESCRIPTION", "current hour information"),
            ("MCP_DEBUG", "TRUE"),
        ])
        .expect("config should parse");

        assert_eq!(config.server_name, "HourMCP");
        assert_eq!(config.server_version, "1.0.0");
        assert_eq!(config.server_description, "current hour information");
        assert!(config.debug);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("BIND_ADDR", "   "), ("MCP_SERVER_NAME", "")])
            .expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.server_name, env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn invalid_port_fails() {
        let err = load(&[("BIND_PORT", "70000")]).expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn invalid_bind_addr_fails() {
        let err = load(&[("BIND_ADDR", "not an address")]).expect_err("expected invalid socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }

    #[test]
    fn invalid_debug_flag_fails() {
        let err = load(&[("MCP_DEBUG", "maybe")]).expect_err("expected invalid flag");
        assert!(matches!(err, ConfigError::InvalidDebugFlag));
    }

    #[test]
    fn bind_socket_combines_addr_and_port() {
        let config = load(&[("BIND_ADDR", "0.0.0.0"), ("BIND_PORT", "3000")])
            .expect("config should parse");
        assert_eq!(
            config.bind_socket().expect("socket"),
            "0.0.0.0:3000".parse().expect("valid socket")
        );
    }
}
