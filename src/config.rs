use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "users-api")]
#[command(about = "CRUD HTTP service over the users table")]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    pub database_url: String,
    #[arg(long, env = "USERS_API_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,
    #[arg(long, env = "USERS_API_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
    #[arg(long, env = "USERS_API_QUERY_TIMEOUT_MS", default_value_t = 5000)]
    pub query_timeout_ms: u64,
}

impl Config {
    pub fn is_in_memory(&self) -> bool {
        let url = self.database_url.as_str();
        url.contains(":memory:") || url.contains("mode=memory")
    }

    /// In-memory SQLite gives every connection its own database, so the pool
    /// is pinned to one connection there.
    pub fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections.max(1)
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["users-api"]).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.pool_size(), 1);
        assert_eq!(config.bind, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.query_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_file_database_uses_max_connections() {
        let config = Config::try_parse_from([
            "users-api",
            "--database-url",
            "sqlite://users.db?mode=rwc",
            "--max-connections",
            "8",
        ])
        .unwrap();
        assert!(!config.is_in_memory());
        assert_eq!(config.pool_size(), 8);
    }
}
