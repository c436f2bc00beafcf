//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Which transport serves the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// rmcp over stdin/stdout.
    #[cfg(feature = "stdio")]
    Stdio,

    /// JSON-RPC over HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the JSON-RPC endpoint; must start with `/`.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Allow any origin, for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Read `MCP_HTTP_*` variables over the defaults.
    fn from_env() -> Self {
        use crate::core::config::env_parse;

        let mut config = Self::default();
        env_parse("MCP_HTTP_PORT", &mut config.port);
        if let Ok(host) = std::env::var("MCP_HTTP_HOST") {
            config.host = host;
        }
        if let Ok(path) = std::env::var("MCP_HTTP_PATH") {
            config.rpc_path = path;
        }
        if let Ok(cors) = std::env::var("MCP_HTTP_CORS") {
            config.enable_cors = !matches!(cors.trim().to_lowercase().as_str(), "false" | "0");
        }
        config
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            Self::Http(HttpConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

impl TransportConfig {
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// HTTP transport on `host:port` with the default path and CORS.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Pick the transport named by `MCP_TRANSPORT`.
    ///
    /// Unknown or unset names fall back to the default transport.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => Self::Stdio,
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env()),
            "" => Self::default(),
            other => {
                tracing::warn!("Unknown transport {other:?}, using the default");
                Self::default()
            }
        }
    }

    /// Reject an HTTP path the router cannot mount.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(cfg) if !cfg.rpc_path.starts_with('/') => {
                Err(format!("HTTP rpc path must start with '/': {:?}", cfg.rpc_path))
            }
            _ => Ok(()),
        }
    }

    /// Short description for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "stdio")]
    #[test]
    fn test_default_is_stdio() {
        let config = TransportConfig::default();
        assert!(config.is_stdio());
        assert_eq!(config.description(), "STDIO (standard MCP mode)");
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_description() {
        let config = TransportConfig::http(9000, "0.0.0.0");
        assert!(!config.is_stdio());
        assert_eq!(config.description(), "HTTP on 0.0.0.0:9000/mcp");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_rpc_path_needs_leading_slash() {
        let config = TransportConfig::Http(HttpConfig {
            rpc_path: "mcp".into(),
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }
}
