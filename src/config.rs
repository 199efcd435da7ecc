//! Configuration management for the Serena client
//!
//! This module handles loading, parsing, and validating configuration
//! from files, environment variables, and command-line arguments, in that
//! order of increasing precedence.

use crate::error::{Result, SerenaError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mcp::session::SessionStore;

/// Default Serena MCP endpoint.
pub const DEFAULT_URL: &str = "http://localhost:9121/mcp";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint and HTTP client settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Session persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Circuit breaker and health monitoring
    #[serde(default)]
    pub connector: ConnectorConfig,

    /// HTTP proxy listener
    #[serde(default)]
    pub proxy: ProxyConfig,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Serena MCP endpoint URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connection pool limits
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    // LSP lookups over large vendor trees are slow.
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: default_timeout_seconds(),
            pool: PoolConfig::default(),
        }
    }
}

impl ServerConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`SerenaError::Config`] when `url` does not parse
    pub fn endpoint(&self) -> Result<url::Url> {
        url::Url::parse(&self.url).map_err(|e| {
            SerenaError::Config(format!("Invalid server url '{}': {}", self.url, e)).into()
        })
    }
}

/// HTTP connection pool limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Idle connections kept alive for reuse
    #[serde(default = "default_max_keepalive")]
    pub max_keepalive_connections: usize,

    /// Requests allowed in flight at once
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Seconds an idle connection is kept before closing
    #[serde(default = "default_keepalive_expiry")]
    pub keepalive_expiry_seconds: u64,
}

fn default_max_keepalive() -> usize {
    5
}

fn default_max_connections() -> usize {
    10
}

fn default_keepalive_expiry() -> u64 {
    30
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_keepalive_connections: default_max_keepalive(),
            max_connections: default_max_connections(),
            keepalive_expiry_seconds: default_keepalive_expiry(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session file path; defaults to a per-user file in the temp dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Seconds of inactivity after which a stored session is discarded
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    1800
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: None,
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl SessionConfig {
    /// Build the session store this configuration describes.
    pub fn store(&self) -> SessionStore {
        let path = self.file.clone().unwrap_or_else(SessionStore::default_path);
        SessionStore::new(path, Duration::from_secs(self.ttl_seconds))
    }
}

/// Circuit breaker and health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Recorded failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds after the last failure before a half-open probe is allowed
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_seconds: u64,

    /// Seconds between health probes when serving
    #[serde(default = "default_health_interval")]
    pub health_interval_seconds: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout() -> u64 {
    30
}

fn default_health_interval() -> u64 {
    30
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_seconds: default_reset_timeout(),
            health_interval_seconds: default_health_interval(),
        }
    }
}

/// HTTP proxy listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Bind address
    #[serde(default = "default_proxy_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

fn default_proxy_host() -> String {
    "127.0.0.1".to_string()
}

fn default_proxy_port() -> u16 {
    9122
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_proxy_host(),
            port: default_proxy_port(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used instead. When
    /// `path` is `None` the per-user default location is tried.
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit configuration file path
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let path = path.map(PathBuf::from).or_else(Self::default_path);

        let mut config = match path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) => {
                tracing::debug!("Config file not found at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Per-user configuration file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "serena", "serena-client")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SerenaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SerenaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("SERENA_URL") {
            if !url.is_empty() {
                self.server.url = url;
            }
        }

        if let Ok(timeout) = std::env::var("SERENA_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.server.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid SERENA_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(file) = std::env::var("SERENA_SESSION_FILE") {
            if !file.is_empty() {
                self.session.file = Some(PathBuf::from(file));
            }
        }

        if let Ok(ttl) = std::env::var("SERENA_SESSION_TTL_SECONDS") {
            if let Ok(value) = ttl.parse() {
                self.session.ttl_seconds = value;
            } else {
                tracing::warn!("Invalid SERENA_SESSION_TTL_SECONDS: {}", ttl);
            }
        }

        if let Ok(host) = std::env::var("SERENA_PROXY_HOST") {
            if !host.is_empty() {
                self.proxy.host = host;
            }
        }

        if let Ok(port) = std::env::var("SERENA_PROXY_PORT") {
            if let Ok(value) = port.parse() {
                self.proxy.port = value;
            } else {
                tracing::warn!("Invalid SERENA_PROXY_PORT: {}", port);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref url) = cli.url {
            self.server.url = url.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.server.timeout_seconds = timeout;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`SerenaError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        let url = self.server.endpoint()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SerenaError::Config(format!(
                "Server url must use http or https, got '{}'",
                url.scheme()
            ))
            .into());
        }

        if self.server.timeout_seconds == 0 {
            return Err(SerenaError::Config(
                "server.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let pool = &self.server.pool;
        if pool.max_connections == 0 || pool.max_keepalive_connections == 0 {
            return Err(SerenaError::Config(
                "server.pool connection limits must be greater than 0".to_string(),
            )
            .into());
        }

        if pool.max_keepalive_connections > pool.max_connections {
            return Err(SerenaError::Config(format!(
                "server.pool.max_keepalive_connections ({}) cannot exceed max_connections ({})",
                pool.max_keepalive_connections, pool.max_connections
            ))
            .into());
        }

        if self.session.ttl_seconds == 0 {
            return Err(SerenaError::Config(
                "session.ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.connector.failure_threshold == 0 {
            return Err(SerenaError::Config(
                "connector.failure_threshold must be greater than 0".to_string(),
            )
            .into());
        }

        if self.connector.health_interval_seconds == 0 {
            return Err(SerenaError::Config(
                "connector.health_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 6] = [
        "SERENA_URL",
        "SERENA_TIMEOUT_SECONDS",
        "SERENA_SESSION_FILE",
        "SERENA_SESSION_TTL_SECONDS",
        "SERENA_PROXY_HOST",
        "SERENA_PROXY_PORT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["serena"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:9121/mcp");
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.server.pool.max_keepalive_connections, 5);
        assert_eq!(config.server.pool.max_connections, 10);
        assert_eq!(config.server.pool.keepalive_expiry_seconds, 30);
        assert_eq!(config.session.ttl_seconds, 1800);
        assert_eq!(config.connector.failure_threshold, 5);
        assert_eq!(config.connector.reset_timeout_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "server:\n  url: http://serena:9121/mcp\nconnector:\n  failure_threshold: 3\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.url, "http://serena:9121/mcp");
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.connector.failure_threshold, 3);
        assert_eq!(config.connector.reset_timeout_seconds, 30);
        assert_eq!(config.proxy.host, "127.0.0.1");
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = Config::default();
        config.server.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.server.url = "ftp://host/mcp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_endpoint_parses_url() {
        let server = ServerConfig::default();
        assert_eq!(server.endpoint().unwrap().as_str(), "http://localhost:9121/mcp");

        let bad = ServerConfig {
            url: "not a url".to_string(),
            ..ServerConfig::default()
        };
        let err = bad.endpoint().unwrap_err();
        assert!(err.to_string().contains("Invalid server url 'not a url'"));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = Config::default();
        config.server.timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SerenaError>(),
            Some(SerenaError::Config(_))
        ));
    }

    #[test]
    fn test_validation_rejects_keepalive_above_total() {
        let mut config = Config::default();
        config.server.pool.max_keepalive_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_pool_and_threshold() {
        let mut config = Config::default();
        config.server.pool.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connector.failure_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = Config::load(path.to_str(), &cli(&[])).unwrap();
        assert_eq!(config.server.url, DEFAULT_URL);
    }

    #[test]
    #[serial]
    fn test_load_from_file_with_env_and_cli_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "server:\n  url: http://file:1/mcp\n  timeout_seconds: 10\nproxy:\n  port: 7000\n",
        )
        .unwrap();

        std::env::set_var("SERENA_URL", "http://env:2/mcp");
        std::env::set_var("SERENA_PROXY_PORT", "7001");
        let config = Config::load(path.to_str(), &cli(&["--timeout", "42"])).unwrap();
        assert_eq!(config.server.url, "http://env:2/mcp");
        assert_eq!(config.server.timeout_seconds, 42);
        assert_eq!(config.proxy.port, 7001);

        let config = Config::load(path.to_str(), &cli(&["--url", "http://cli:3/mcp"])).unwrap();
        assert_eq!(config.server.url, "http://cli:3/mcp");
        assert_eq!(config.server.timeout_seconds, 10);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clear_env();
        std::env::set_var("SERENA_TIMEOUT_SECONDS", "soon");
        std::env::set_var("SERENA_SESSION_TTL_SECONDS", "60");
        std::env::set_var("SERENA_SESSION_FILE", "/tmp/custom-session.json");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = Config::load(path.to_str(), &cli(&[])).unwrap();
        assert_eq!(config.server.timeout_seconds, 120);
        assert_eq!(config.session.ttl_seconds, 60);
        assert_eq!(
            config.session.store().path(),
            Path::new("/tmp/custom-session.json")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_yaml() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [unclosed").unwrap();
        assert!(Config::load(path.to_str(), &cli(&[])).is_err());
    }
}
