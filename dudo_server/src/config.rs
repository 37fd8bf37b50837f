//! Server configuration management.
//!
//! Consolidates environment variable reads and validates them once at
//! startup.

use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Complete server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server bind address.
    pub bind: SocketAddr,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SERVER_BIND address '{value}': {reason}")]
    InvalidBind { value: String, reason: String },
}

impl ServerConfig {
    /// Loads configuration from environment variables, with an
    /// optional bind override from CLI args taking precedence.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let value =
                    std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                value.parse().map_err(|e: std::net::AddrParseError| {
                    ConfigError::InvalidBind {
                        value,
                        reason: e.to_string(),
                    }
                })?
            }
        };
        Ok(Self { bind })
    }
}
