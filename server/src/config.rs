//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use takehome_fx::{RateCacheConfig, DEFAULT_RATES_URL};

/// Upstream rate feed configuration.
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// Latest-rates endpoint, USD based.
    pub url: String,
    /// How long a fetched table is served before refetching.
    pub freshness_window: Duration,
    /// Upper bound on one upstream fetch.
    pub fetch_timeout: Duration,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RATES_URL.to_string(),
            freshness_window: Duration::from_secs(60 * 60),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/takehome".to_string(),
            max_connections: 10,
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
    /// Secret the identity provider signs session cookies with. Unsigned
    /// cookies are accepted only when unset.
    pub secret: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "connect.sid".to_string(),
            secret: None,
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Rate feed configuration.
    pub rates: RateConfig,
    /// Session configuration.
    pub session: SessionConfig,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 5000,
            database: DatabaseConfig::default(),
            rates: RateConfig::default(),
            session: SessionConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored and the default kept.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = var("TAKEHOME_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = var("TAKEHOME_LISTEN_PORT").or_else(|| var("PORT")) {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(url) = var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Some(max) = var("DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse() {
                config.database.max_connections = max;
            }
        }

        if let Some(url) = var("RATES_URL") {
            config.rates.url = url;
        }

        if let Some(secs) = var("RATES_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.rates.freshness_window = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = var("RATES_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.rates.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(name) = var("SESSION_COOKIE_NAME") {
            config.session.cookie_name = name;
        }

        if let Some(secret) = var("SESSION_SECRET") {
            config.session.secret = Some(secret);
        }

        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.database.max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if !self.rates.url.starts_with("http://") && !self.rates.url.starts_with("https://") {
            return Err(format!("Rates URL must be http(s): {}", self.rates.url));
        }

        if self.rates.fetch_timeout.is_zero() {
            return Err("Rate fetch timeout cannot be 0".to_string());
        }

        if self.session.cookie_name.is_empty() {
            return Err("Session cookie name cannot be empty".to_string());
        }

        if self.session.secret.as_deref() == Some("") {
            return Err("Session secret cannot be empty".to_string());
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.listen_addr, self.listen_port)
            .parse()
            .map_err(|e| format!("Invalid listen address {}: {}", self.listen_addr, e))
    }

    /// Rate cache settings derived from the rate feed configuration.
    pub fn rate_cache_config(&self) -> RateCacheConfig {
        RateCacheConfig {
            freshness_window: chrono::Duration::from_std(self.rates.freshness_window)
                .unwrap_or_else(|_| takehome_common::constants::rate_freshness_window()),
            fetch_timeout: self.rates.fetch_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rates.url, "https://open.er-api.com/v6/latest/USD");
        assert_eq!(
            config.rate_cache_config().freshness_window,
            chrono::Duration::hours(1)
        );
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ServerConfig::default();
        config.listen_port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.rates.url = "ftp://rates".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.listen_addr = "not an address".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.session.secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://db/app"),
            ("RATES_CACHE_TTL_SECS", "60"),
            ("RATES_FETCH_TIMEOUT_SECS", "not-a-number"),
            ("SESSION_COOKIE_NAME", "sid"),
            ("SESSION_SECRET", "keyboard cat"),
        ]);

        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.database.url, "postgres://db/app");
        assert_eq!(config.rates.freshness_window, Duration::from_secs(60));
        assert_eq!(config.rates.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.secret.as_deref(), Some("keyboard cat"));
        assert!(ServerConfig::default().session.secret.is_none());
    }

    #[test]
    fn test_explicit_port_wins_over_platform_port() {
        let config = from_map(&[("TAKEHOME_LISTEN_PORT", "7000"), ("PORT", "8080")]);
        assert_eq!(config.listen_port, 7000);
    }
}
