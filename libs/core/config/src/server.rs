use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// Bind address for the HTTP listener.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// "host:port", suitable for `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// `HOST` defaults to 0.0.0.0, `PORT` to 8080.
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse_or("PORT", 8080u16)?;

        Ok(Self { host, port })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 8080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_env_with_defaults() {
        temp_env::with_vars([("HOST", None::<&str>), ("PORT", None::<&str>)], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
        });
    }

    #[test]
    fn test_server_config_from_env_with_custom_values() {
        temp_env::with_vars([("HOST", Some("127.0.0.1")), ("PORT", Some("3000"))], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "127.0.0.1:3000");
        });
    }

    #[test]
    fn test_server_config_from_env_port_out_of_range() {
        temp_env::with_var("PORT", Some("99999"), || {
            let err = ServerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("PORT"));
        });
    }
}
