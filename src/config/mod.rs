//! Configuration management
//!
//! Configuration is loaded from a YAML file, overridden by environment
//! variables, and missing values fall back to defaults. The composition
//! root loads it once and passes the pieces down; nothing reads
//! configuration ambiently.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Bootstrap (seed) configuration
    #[serde(default)]
    pub seed: SeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            upload: UploadConfig::default(),
            session: SessionConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration (SQLite)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/triptych.db".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are stored in
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// URL prefix the directory is served under
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            public_prefix: default_public_prefix(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("files")
}

fn default_public_prefix() -> String {
    "/files".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_ttl_days")]
    pub ttl_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_session_ttl_days(),
        }
    }
}

fn default_session_ttl_days() -> i64 {
    7
}

/// Bootstrap configuration: the admin account created on first start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Admin display name
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    /// Admin login email
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Admin password; change it in any real deployment
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_name: default_admin_name(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
        }
    }
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

fn default_admin_email() -> String {
    "admin@example.com".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl SeedConfig {
    /// Whether the deployment still uses the shipped default password.
    pub fn uses_default_password(&self) -> bool {
        self.admin_password == default_admin_password()
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults; an unreadable or
    /// invalid file is an error with the location of the problem.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Environment variables follow the pattern:
    /// - TRIPTYCH_SERVER_HOST
    /// - TRIPTYCH_SERVER_PORT
    /// - TRIPTYCH_SERVER_CORS_ORIGIN
    /// - TRIPTYCH_DATABASE_URL
    /// - TRIPTYCH_UPLOAD_PATH
    /// - TRIPTYCH_UPLOAD_PUBLIC_PREFIX
    /// - TRIPTYCH_SESSION_TTL_DAYS
    /// - TRIPTYCH_SEED_ADMIN_NAME
    /// - TRIPTYCH_SEED_ADMIN_EMAIL
    /// - TRIPTYCH_SEED_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TRIPTYCH_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TRIPTYCH_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("TRIPTYCH_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("TRIPTYCH_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("TRIPTYCH_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(prefix) = std::env::var("TRIPTYCH_UPLOAD_PUBLIC_PREFIX") {
            self.upload.public_prefix = prefix;
        }

        if let Ok(ttl) = std::env::var("TRIPTYCH_SESSION_TTL_DAYS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                if ttl > 0 {
                    self.session.ttl_days = ttl;
                }
            }
        }

        if let Ok(name) = std::env::var("TRIPTYCH_SEED_ADMIN_NAME") {
            self.seed.admin_name = name;
        }
        if let Ok(email) = std::env::var("TRIPTYCH_SEED_ADMIN_EMAIL") {
            self.seed.admin_email = email;
        }
        if let Ok(password) = std::env::var("TRIPTYCH_SEED_ADMIN_PASSWORD") {
            self.seed.admin_password = password;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
// Both `tests` and `property_tests` modules use this to prevent races.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ALL_ENV_VARS: &[&str] = &[
    "TRIPTYCH_SERVER_HOST",
    "TRIPTYCH_SERVER_PORT",
    "TRIPTYCH_SERVER_CORS_ORIGIN",
    "TRIPTYCH_DATABASE_URL",
    "TRIPTYCH_UPLOAD_PATH",
    "TRIPTYCH_UPLOAD_PUBLIC_PREFIX",
    "TRIPTYCH_SESSION_TTL_DAYS",
    "TRIPTYCH_SEED_ADMIN_NAME",
    "TRIPTYCH_SEED_ADMIN_EMAIL",
    "TRIPTYCH_SEED_ADMIN_PASSWORD",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for var in super::ALL_ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/triptych.db");
        assert_eq!(config.upload.path, PathBuf::from("files"));
        assert_eq!(config.upload.public_prefix, "/files");
        assert_eq!(config.session.ttl_days, 7);
        assert_eq!(config.seed.admin_email, "admin@example.com");
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        // Specified value
        assert_eq!(config.server.port, 3000);
        // Default values
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.url, "data/triptych.db");
        assert_eq!(config.seed.admin_password, "admin123");
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origin: "https://cms.example.org"
database:
  url: "var/cms.db"
upload:
  path: "var/files"
  public_prefix: "/media"
  max_file_size: 5242880
session:
  ttl_days: 30
seed:
  admin_name: "Root"
  admin_email: "root@example.org"
  admin_password: "s3cret"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "https://cms.example.org");
        assert_eq!(config.database.url, "var/cms.db");
        assert_eq!(config.upload.path, PathBuf::from("var/files"));
        assert_eq!(config.upload.public_prefix, "/media");
        assert_eq!(config.upload.max_file_size, 5242880);
        assert_eq!(config.session.ttl_days, 30);
        assert_eq!(config.seed.admin_name, "Root");
        assert_eq!(config.seed.admin_email, "root@example.org");
        assert!(!config.seed.uses_default_password());
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("parse") || err_msg.contains("invalid"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_env_override_server_config() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: \"0.0.0.0\"\n  port: 8080\n").unwrap();

        std::env::set_var("TRIPTYCH_SERVER_HOST", "192.168.1.1");
        std::env::set_var("TRIPTYCH_SERVER_PORT", "4000");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);

        std::env::remove_var("TRIPTYCH_SERVER_HOST");
        std::env::remove_var("TRIPTYCH_SERVER_PORT");
    }

    #[test]
    fn test_env_override_seed_config() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("TRIPTYCH_SEED_ADMIN_EMAIL", "ops@example.org");
        std::env::set_var("TRIPTYCH_SEED_ADMIN_PASSWORD", "rotated");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.seed.admin_email, "ops@example.org");
        assert_eq!(config.seed.admin_password, "rotated");
        assert!(!config.seed.uses_default_password());

        std::env::remove_var("TRIPTYCH_SEED_ADMIN_EMAIL");
        std::env::remove_var("TRIPTYCH_SEED_ADMIN_PASSWORD");
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("TRIPTYCH_SERVER_PORT", "not_a_number");

        let config = Config::load_with_env(file.path()).unwrap();

        // Should keep original value when env var is invalid
        assert_eq!(config.server.port, 8080);

        std::env::remove_var("TRIPTYCH_SERVER_PORT");
    }

    #[test]
    fn test_env_override_nonpositive_ttl_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "session:\n  ttl_days: 14\n").unwrap();

        std::env::set_var("TRIPTYCH_SESSION_TTL_DAYS", "0");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.session.ttl_days, 14);

        std::env::remove_var("TRIPTYCH_SESSION_TTL_DAYS");
    }

    #[test]
    fn test_upload_type_allowed() {
        let config = UploadConfig::default();
        assert!(config.is_type_allowed("image/png"));
        assert!(config.is_type_allowed("image/jpeg"));
        assert!(!config.is_type_allowed("application/pdf"));
        assert_eq!(config.get_extension("image/webp"), "webp");
        assert_eq!(config.get_extension("application/pdf"), "bin");
    }
}

/// Property-based tests for configuration parsing
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for var in super::ALL_ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            Just("0.0.0.0".to_string()),
            "[a-z][a-z0-9]{0,10}",
        ]
    }

    fn valid_port_strategy() -> impl Strategy<Value = u16> {
        1u16..=65535
    }

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            valid_host_strategy(),
            valid_port_strategy(),
            "[a-z][a-z0-9_/]{0,20}\\.db",
            1i64..=365,
            "[a-z]{3,10}@example\\.org",
        )
            .prop_map(|(host, port, db_url, ttl_days, admin_email)| Config {
                server: ServerConfig {
                    host,
                    port,
                    cors_origin: default_cors_origin(),
                },
                database: DatabaseConfig { url: db_url },
                upload: UploadConfig::default(),
                session: SessionConfig { ttl_days },
                seed: SeedConfig {
                    admin_email,
                    ..SeedConfig::default()
                },
            })
    }

    fn malformed_yaml_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("server:\n  port: not_a_number".to_string()),
            Just("server:\n  port: [1, 2, 3]".to_string()),
            Just("server:\n  port: 99999999999999999999".to_string()),
            Just("session:\n  ttl_days: \"soon\"".to_string()),
            Just("upload:\n  max_file_size: -5".to_string()),
            Just("server: [invalid, list, for, server]".to_string()),
            Just("database: 12345".to_string()),
            Just("seed: true".to_string()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing a config to YAML and parsing it back yields an
        /// equivalent config.
        #[test]
        fn property_config_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.host, parsed.server.host);
            prop_assert_eq!(config.server.port, parsed.server.port);
            prop_assert_eq!(config.database.url, parsed.database.url);
            prop_assert_eq!(config.session.ttl_days, parsed.session.ttl_days);
            prop_assert_eq!(config.seed.admin_email, parsed.seed.admin_email);
        }

        /// Any malformed config file produces an error, never a panic or a
        /// silently defaulted config.
        #[test]
        fn property_invalid_config_is_an_error(yaml in malformed_yaml_strategy()) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let result = Config::load(file.path());
            prop_assert!(result.is_err(), "Malformed YAML should produce an error");

            let err_msg = result.unwrap_err().to_string();
            prop_assert!(err_msg.len() > 10, "Error message should be descriptive: {}", err_msg);
        }

        /// Environment variables take precedence over file values.
        #[test]
        fn property_env_precedence_over_file(
            file_port in 1000u16..2000,
            env_port in 3000u16..4000,
        ) {
            let _guard = lock_env();

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "server:\n  port: {}\n", file_port).expect("Failed to write config");

            std::env::set_var("TRIPTYCH_SERVER_PORT", env_port.to_string());

            let config = Config::load_with_env(file.path()).expect("Failed to load config");

            prop_assert_eq!(config.server.port, env_port);
            prop_assert_ne!(config.server.port, file_port);

            std::env::remove_var("TRIPTYCH_SERVER_PORT");
        }
    }
}
