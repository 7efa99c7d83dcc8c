//! RON configuration parsing for the game server

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use warroom_core::{NationSeed, StartingStock};

/// Environment variable that overrides the listen port
pub const PORT_VAR: &str = "PORT";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Listen address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Database file; games are kept in memory when absent
    #[serde(default)]
    pub database: Option<String>,
    /// Default tracing directive, `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Runtime worker threads, defaults to the number of CPUs
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Players required before a game can start
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    /// Nations created with every new game
    #[serde(default = "default_nations")]
    pub default_nations: Vec<NationSeed>,
    /// Values every nation starts with
    #[serde(default)]
    pub starting_stock: StartingStock,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_min_players() -> usize {
    2
}

fn default_nations() -> Vec<NationSeed> {
    vec![
        NationSeed::new("Germany", "#444"),
        NationSeed::new("United Kingdom", "#1f77b4"),
        NationSeed::new("USA", "#2ca02c"),
        NationSeed::new("USSR", "#d62728"),
        NationSeed::new("Japan", "#ff7f0e"),
        NationSeed::new("Italy", "#9467bd"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database: None,
            log_filter: default_log_filter(),
            worker_threads: None,
            min_players: default_min_players(),
            default_nations: default_nations(),
            starting_stock: StartingStock::default(),
        }
    }
}

impl Config {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_ron(&content)
    }

    /// Parse and validate configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players == 0 {
            return Err(ConfigError::Validation(
                "min_players must be at least 1".to_string(),
            ));
        }
        if self.default_nations.is_empty() {
            return Err(ConfigError::Validation(
                "default_nations must not be empty".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for seed in &self.default_nations {
            if !names.insert(seed.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate nation {}",
                    seed.name
                )));
            }
        }
        self.listen_addr(None)?;
        Ok(())
    }

    /// Socket address to bind, with the port replaced by `port` if given
    pub fn listen_addr(&self, port: Option<&str>) -> Result<SocketAddr, ConfigError> {
        let mut addr: SocketAddr = self
            .listen
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid listen address {}", self.listen)))?;
        if let Some(port) = port {
            let port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid {PORT_VAR} {port}")))?;
            addr.set_port(port);
        }
        Ok(addr)
    }

    /// Worker thread count clamped to `[1, num_cpus]`
    pub fn worker_threads(&self) -> usize {
        let cpus = num_cpus::get().max(1);
        self.worker_threads.unwrap_or(cpus).clamp(1, cpus)
    }
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_ron("()").unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert!(config.database.is_none());
        assert_eq!(config.min_players, 2);
        assert_eq!(config.default_nations.len(), 6);
        assert_eq!(config.default_nations[1].name, "United Kingdom");
        assert_eq!(config.starting_stock, StartingStock::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_ron(
            r##"(
                listen: "127.0.0.1:3000",
                database: Some("games.db"),
                log_filter: "debug",
                worker_threads: Some(1),
                min_players: 3,
                default_nations: [
                    (name: "France", color: "#0055a4"),
                    (name: "Poland", color: "#dc143c"),
                ],
                starting_stock: (money: 80, troops: 12),
            )"##,
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("games.db"));
        assert_eq!(config.min_players, 3);
        assert_eq!(config.default_nations[0].name, "France");
        assert_eq!(config.starting_stock.money, 80);
        assert_eq!(config.starting_stock.troops, 12);
        // Unset stock fields keep their defaults.
        assert_eq!(config.starting_stock.steel, 20);
        assert_eq!(config.worker_threads(), 1);
    }

    #[test]
    fn test_shipped_config() {
        let config = Config::from_ron(include_str!("../../../config/server.ron")).unwrap();
        assert_eq!(config.database.as_deref(), Some("warroom.db"));
        assert_eq!(config.default_nations, Config::default().default_nations);
        assert_eq!(config.starting_stock, StartingStock::default());
    }

    #[test]
    fn test_port_override() {
        let config = Config::default();
        assert_eq!(config.listen_addr(None).unwrap().port(), 8080);
        assert_eq!(config.listen_addr(Some("9000")).unwrap().port(), 9000);
        assert!(config.listen_addr(Some("http")).is_err());
    }

    #[test]
    fn test_worker_threads_clamped() {
        let mut config = Config::default();
        config.worker_threads = Some(0);
        assert_eq!(config.worker_threads(), 1);
        config.worker_threads = Some(usize::MAX);
        assert_eq!(config.worker_threads(), num_cpus::get().max(1));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Config::from_ron("(min_players: 0)"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::from_ron("(default_nations: [])"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::from_ron(r##"(default_nations: [(name: "USA", color: "#1"), (name: "USA", color: "#2")])"##),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::from_ron(r#"(listen: "nowhere")"#),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(Config::from_ron("(listen: 5"), Err(ConfigError::Parse(_))));
    }
}
