use super::*;
use std::time::Duration;

/// Process configuration.
/// Every knob reads from the environment and may be overridden on the command line.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "backend", about = "Tycoon session and turn arbitration server")]
pub struct Config {
    /// Address the HTTP and WebSocket server binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8888")]
    pub bind: String,
    /// PostgreSQL connection string.
    #[arg(long, env = "DB_URL")]
    pub db_url: String,
    /// Hard deadline on external agent decisions, in milliseconds.
    #[arg(long, env = "AGENT_DECISION_TIMEOUT_MS", default_value_t = AGENT_TIMEOUT_MILLIS)]
    pub agent_timeout_ms: u64,
    /// Concurrent sockets allowed per network origin.
    #[arg(long, env = "MAX_CONNECTIONS_PER_ORIGIN", default_value_t = MAX_CONNECTIONS_PER_ORIGIN)]
    pub max_connections: usize,
    /// Socket events allowed per connection per minute.
    #[arg(long, env = "EVENTS_PER_MINUTE", default_value_t = EVENTS_PER_WINDOW)]
    pub events_per_minute: u32,
    /// Lifetime of cached game snapshots, in seconds.
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,
    /// Roll window of a turn, in seconds.
    #[arg(long, env = "ROLL_WINDOW_SECS", default_value_t = ROLL_WINDOW_SECS)]
    pub roll_window_secs: u64,
    /// HTTP worker threads.
    #[arg(long, env = "WORKERS", default_value_t = 6)]
    pub workers: usize,
}

impl Config {
    pub fn from_env() -> Self {
        <Self as clap::Parser>::parse()
    }
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
    pub fn roll_window(&self) -> Duration {
        Duration::from_secs(self.roll_window_secs)
    }
    pub fn event_window(&self) -> Duration {
        Duration::from_secs(EVENT_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    #[test]
    fn defaults_match_documented_knobs() {
        let config = Config::try_parse_from(["backend", "--db-url", "postgres://x"]).unwrap();
        assert_eq!(config.agent_timeout(), Duration::from_millis(8000));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.events_per_minute, 60);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.roll_window(), Duration::from_secs(90));
    }
    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "backend",
            "--db-url",
            "postgres://x",
            "--agent-timeout-ms",
            "250",
            "--max-connections",
            "2",
        ])
        .unwrap();
        assert_eq!(config.agent_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_connections, 2);
    }
}
