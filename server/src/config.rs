use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to, e.g. "127.0.0.1:8080"
    pub bind_addr: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Ticks between snapshot broadcasts (2 = half the tick rate)
    pub snapshot_interval: u32,
    /// Maximum number of concurrent connections
    pub max_clients: usize,
    /// Silence after which a connection is dropped
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            tick_rate: 60,
            snapshot_interval: 2,
            max_clients: 32,
            client_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_duration() {
        let config = ServerConfig::default();
        let millis = config.tick_duration().as_secs_f64() * 1000.0;
        assert!((millis - 16.667).abs() < 0.01);
    }

    #[test]
    fn test_zero_tick_rate_is_clamped() {
        let config = ServerConfig {
            tick_rate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }
}
