use shared::{DEFAULT_GROWTH_DELAY, DEFAULT_PORT, DEFAULT_RIPEN_WORKERS};
use std::time::Duration;

/// Runtime settings for a farm server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Time from planting until a crop ripens.
    pub growth_delay: Duration,
    /// Upper bound on growth timers firing at the same time.
    pub ripen_workers: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            growth_delay: DEFAULT_GROWTH_DELAY,
            ripen_workers: DEFAULT_RIPEN_WORKERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:8888");
        assert_eq!(config.growth_delay, Duration::from_secs(10));
        assert_eq!(config.ripen_workers, 4);
    }

    #[test]
    fn test_address_uses_host_and_port() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.address(), "0.0.0.0:0");
    }
}
