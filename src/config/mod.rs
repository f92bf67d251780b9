// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, CorsConfig};

/// Environment variable prefix, e.g. `BLOG_SERVER__PORT=9000`
const ENV_PREFIX: &str = "BLOG";

impl Config {
    /// Load configuration from specified file path (without extension).
    /// A missing file is not an error; defaults and `BLOG_*` variables still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default(
                "cors.allowed_origins",
                vec![
                    "https://650242fc.blog-frontend-5dr.pages.dev",
                    "https://blog-frontend-5dr.pages.dev",
                ],
            )?
            .set_default("cors.allowed_origin_suffix", ".pages.dev")?
            .set_default("database.url", "sqlite://blog.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("database.create_schema", true)?
            .set_default("objects.enabled", true)?
            .set_default("objects.root", "data/objects")?
            .set_default("objects.transfer_timeout", 600)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/config").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
        assert_eq!(cfg.cors.allowed_origin_suffix, ".pages.dev");
        assert!(cfg
            .cors
            .allowed_origins
            .iter()
            .any(|o| o == "https://blog-frontend-5dr.pages.dev"));
        assert!(cfg.objects.enabled);
        assert_eq!(cfg.objects.transfer_timeout, 600);
        assert!(cfg.database.create_schema);
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[cors]
allowed_origins = ["https://blog.example.org"]
allowed_origin_suffix = ""

[objects]
enabled = false
"#,
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.cors.allowed_origins, vec!["https://blog.example.org"]);
        assert!(cfg.cors.allowed_origin_suffix.is_empty());
        assert!(!cfg.objects.enabled);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
