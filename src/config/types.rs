// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub objects: ObjectStoreConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

/// Cross-origin policy, fixed for the lifetime of the process
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Origins accepted by exact string comparison
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Any origin ending with this suffix is accepted (empty disables the rule)
    #[serde(default)]
    pub allowed_origin_suffix: String,
}

/// Relational store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Run `CREATE TABLE IF NOT EXISTS` for the posts table on startup
    pub create_schema: bool,
}

/// Object store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStoreConfig {
    /// When false, `/upload` and `/files/` are not routed
    pub enabled: bool,
    pub root: String,
    /// Seconds a connection may stay open to carry an upload or download
    pub transfer_timeout: u64,
}
