//! Storage Proxy Configuration
//!
//! This module provides the configuration file structures for the storage
//! proxy. Every section is optional in the TOML file; missing values fall
//! back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::key::ProxyConfig;

/// Main storage proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Bucket and key mapping configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_address")]
    pub address: String,

    /// Port to serve
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Bucket and key mapping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket name, also used to detect bucket-qualified request paths
    #[serde(default)]
    pub bucket: String,

    /// Object store URL (defaults to `gs://<bucket>`)
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix prepended to keys that are not bucket-qualified (e.g. a version directory)
    #[serde(default)]
    pub default_prefix: String,

    /// Runtime path prefix stripped from incoming request paths (e.g. `/microservices/`)
    #[serde(default)]
    pub strip_path_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it, so that command line
    /// overrides can fill in missing values first
    pub fn read(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.storage.bucket.is_empty() {
            return Err(crate::Error::Config(
                "storage.bucket cannot be empty; specify a storage bucket (--bucket or [storage] bucket)"
                    .into(),
            ));
        }

        if self.server.address.is_empty() {
            return Err(crate::Error::Config("server.address cannot be empty".into()));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(crate::Error::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Get the `host:port` address to bind
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }

    /// Get the object store URL, defaulting to the Google Cloud Storage bucket
    pub fn store_url(&self) -> String {
        match &self.storage.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("gs://{}", self.storage.bucket),
        }
    }

    /// Build the immutable key mapping shared by all request handlers
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            default_prefix: self.storage.default_prefix.clone(),
            bucket_name: self.storage.bucket.clone(),
            strip_path_prefix: self.storage.strip_path_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
address = "0.0.0.0"
port = 9000

[storage]
bucket = "assets"
default_prefix = "v42/"
strip_path_prefix = "/microservices/"

[logging]
level = "debug"
format = "json"
"#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.listen_address(), "0.0.0.0:9000");
        assert_eq!(config.store_url(), "gs://assets");
        assert_eq!(config.logging.format, "json");

        let proxy = config.proxy_config();
        assert_eq!(proxy.bucket_name, "assets");
        assert_eq!(proxy.default_prefix, "v42/");
        assert_eq!(proxy.strip_path_prefix, "/microservices/");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_str("[storage]\nbucket = \"b\"\n").unwrap();
        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert_eq!(config.logging.level, "info");
        assert!(config.storage.default_prefix.is_empty());
        assert!(config.storage.strip_path_prefix.is_empty());
    }

    #[test]
    fn test_explicit_store_url() {
        let toml = r#"
[storage]
bucket = "b"
url = "memory:///"
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.store_url(), "memory:///");
    }

    #[test]
    fn test_missing_bucket_rejected() {
        let err = Config::from_str("[server]\nport = 8081\n").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(err.to_string().contains("--bucket"));
    }

    #[test]
    fn test_read_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage-proxy.toml");
        std::fs::write(&path, "[server]\nport = 9001\n").unwrap();

        let mut config = Config::read(&path).unwrap();
        assert_eq!(config.server.port, 9001);
        assert!(config.validate().is_err());
        assert!(Config::from_file(&path).is_err());

        config.storage.bucket = "from-flag".into();
        config.validate().unwrap();
    }

    #[test]
    fn test_read_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[server\nport = \n").unwrap();

        assert!(matches!(Config::read(&path), Err(crate::Error::ConfigParse(_))));
    }

    #[test]
    fn test_bad_log_format_rejected() {
        let toml = r#"
[storage]
bucket = "b"

[logging]
format = "xml"
"#;
        assert!(Config::from_str(toml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage-proxy.toml");
        std::fs::write(&path, "[storage]\nbucket = \"from-file\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.storage.bucket, "from-file");
    }
}
