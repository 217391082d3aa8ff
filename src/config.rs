use anyhow::{Context, Result};
use std::env;

use crate::errors::details::DEFAULT_INSTANCE;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reported as `instance` in validation errors. Behind a load balancer
    /// each node should set its own.
    pub instance_name: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            instance_name: DEFAULT_INSTANCE.to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
                instance_name: env::var("INSTANCE_NAME")
                    .unwrap_or_else(|_| DEFAULT_INSTANCE.to_string()),
                max_body_bytes: env::var("MAX_BODY_BYTES")
                    .unwrap_or_else(|_| "65536".to_string())
                    .parse()
                    .context("MAX_BODY_BYTES must be a valid number")?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_address() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                ..ServerConfig::default()
            },
        };

        assert_eq!(config.server_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8080);
        assert_eq!(server.instance_name, "CT Portal");
        assert_eq!(server.max_body_bytes, 65536);
    }
}
