//! Server settings read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use crate::events::DEFAULT_ROUTING_KEY;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for a whole request, storage calls included.
    pub request_timeout: Duration,
    /// Routing key attached to every request event.
    pub events_routing_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            events_routing_key: DEFAULT_ROUTING_KEY.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST`: Bind host (default: 0.0.0.0)
    /// - `PORT`, else `USER_SERVICE_PORT_NUMBER`: Bind port (default: 8080)
    /// - `REQUEST_TIMEOUT_SECS`: Request deadline in seconds (default: 30)
    /// - `EVENTS_ROUTING_KEY`: Routing key for request events (default: user.request)
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);

        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("USER_SERVICE_PORT_NUMBER"))
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let events_routing_key = std::env::var("EVENTS_ROUTING_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.events_routing_key);

        Self {
            host,
            port,
            request_timeout,
            events_routing_key,
        }
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_addr() {
        let addr = ServerConfig::default().bind_addr().unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_invalid_host_is_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
