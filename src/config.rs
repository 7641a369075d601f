//! Configuration for the server and the template watcher.
//!
//! Layered configuration:
//! - Default values
//! - TOML configuration file (`.hotpage/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `HOTPAGE_` and use double
//! underscores to separate nested levels:
//! - `HOTPAGE_DATABASE__URI=mongodb://localhost:27017` sets `database.uri`
//! - `HOTPAGE_WATCH__DEBOUNCE_MS=250` sets `watch.debounce_ms`
//! - `HOTPAGE_SERVER__BIND=127.0.0.1:3000` sets `server.bind`
//!
//! `PORT` is honoured on top of `server.bind` for hosting platforms that
//! assign the port at runtime.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR: &str = ".hotpage";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "HOTPAGE_";

/// Errors resolving values that are not plain settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No database URI configured; set database.uri or database.uri_file")]
    MissingDatabaseUri,

    #[error("Cannot read secret {path}: {source}")]
    SecretUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file {path} is empty")]
    SecretEmpty { path: PathBuf },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding `.hotpage`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Connection string. Prefer `uri_file` outside local development.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// File holding the connection string, e.g. a mounted secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_file: Option<PathBuf>,

    #[serde(default = "default_database_name")]
    pub name: String,

    /// Collection holding the single aggregate content document
    #[serde(default = "default_content_collection")]
    pub content_collection: String,

    #[serde(default = "default_member_collection")]
    pub member_collection: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Directory tree holding editable templates and styles
    #[serde(default = "default_watch_root")]
    pub root: PathBuf,

    /// Suppression window after an accepted read
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Show the idle indicator on interactive terminals
    #[serde(default = "default_true")]
    pub indicator: bool,

    #[serde(default = "default_indicator_period_ms")]
    pub indicator_period_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TemplatesConfig {
    /// Keys starting with this token are registered as partials
    #[serde(default = "default_fragment_prefix")]
    pub fragment_prefix: String,

    /// Snapshot key rendered for `GET /`
    #[serde(default = "default_index_key")]
    pub index_key: String,

    /// Directory with on-disk templates used before the database has content
    #[serde(default = "default_watch_root")]
    pub fallback_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directories served as static files at the site root
    #[serde(default = "default_static_dirs")]
    pub static_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `mongodb = "warn"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_version() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_database_name() -> String { "hotpage".to_string() }
fn default_content_collection() -> String { "page_source".to_string() }
fn default_member_collection() -> String { "members".to_string() }
fn default_watch_root() -> PathBuf { PathBuf::from("./render-templates") }
fn default_debounce_ms() -> u64 { 100 }
fn default_indicator_period_ms() -> u64 { 2000 }
fn default_fragment_prefix() -> String { "section".to_string() }
fn default_index_key() -> String { "index".to_string() }
fn default_bind() -> String { "0.0.0.0:8080".to_string() }
fn default_static_dirs() -> Vec<PathBuf> { vec![PathBuf::from("./css"), PathBuf::from("./images")] }
fn default_log_level() -> String { "info".to_string() }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            database: DatabaseConfig::default(),
            watch: WatchConfig::default(),
            templates: TemplatesConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: None,
            uri_file: None,
            name: default_database_name(),
            content_collection: default_content_collection(),
            member_collection: default_member_collection(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: default_watch_root(),
            debounce_ms: default_debounce_ms(),
            indicator: true,
            indicator_period_ms: default_indicator_period_ms(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            fragment_prefix: default_fragment_prefix(),
            index_key: default_index_key(),
            fallback_dir: default_watch_root(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dirs: default_static_dirs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection string, reading `uri_file` when no inline URI is set.
    pub fn resolve_uri(&self) -> Result<String, ConfigError> {
        if let Some(uri) = self.uri.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(uri.trim().to_string());
        }

        let path = self.uri_file.as_ref().ok_or(ConfigError::MissingDatabaseUri)?;
        let secret = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::SecretUnreadable {
                path: path.clone(),
                source,
            }
        })?;

        let secret = secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::SecretEmpty { path: path.clone() });
        }
        Ok(secret.to_string())
    }
}

impl ServerConfig {
    /// Bind address with the `PORT` environment variable applied.
    pub fn bind_address(&self) -> String {
        match std::env::var("PORT") {
            Ok(port) => with_port(&self.bind, &port),
            Err(_) => self.bind.clone(),
        }
    }
}

/// Replace the port of `bind` when `port` parses as one.
///
/// `bind` may be a bare host, `host:port`, a bracketed IPv6 address with or
/// without a port, or a bare IPv6 address, which gets bracketed.
fn with_port(bind: &str, port: &str) -> String {
    let Ok(port) = port.trim().parse::<u16>() else {
        tracing::warn!("Ignoring invalid PORT value '{port}'");
        return bind.to_string();
    };
    let host = match bind.rfind(']') {
        Some(end) => bind[..=end].to_string(),
        None => match bind.matches(':').count() {
            0 => bind.to_string(),
            1 => bind.split_once(':').map(|(host, _)| host).unwrap_or(bind).to_string(),
            _ => format!("[{bind}]"),
        },
    };
    format!("{host}:{port}")
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.hotpage/settings.toml` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the directory where `.hotpage` is located
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let existed = config_path.exists();
        Settings::default().save(&config_path)?;

        if existed {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.watch.root, PathBuf::from("./render-templates"));
        assert_eq!(settings.watch.debounce_ms, 100);
        assert_eq!(settings.templates.fragment_prefix, "section");
        assert_eq!(settings.templates.index_key, "index");
        assert_eq!(settings.database.content_collection, "page_source");
        assert!(settings.database.uri.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[database]
uri = "mongodb://db.internal:27017"
name = "site"

[templates]
fragment_prefix = "part"

[server]
bind = "127.0.0.1:3000"
static_dirs = ["./public"]

[logging.modules]
mongodb = "warn"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.database.uri.as_deref(), Some("mongodb://db.internal:27017"));
        assert_eq!(settings.database.name, "site");
        assert_eq!(settings.templates.fragment_prefix, "part");
        assert_eq!(settings.server.bind, "127.0.0.1:3000");
        assert_eq!(settings.server.static_dirs, vec![PathBuf::from("./public")]);
        assert_eq!(settings.logging.modules["mongodb"], "warn");
        // Untouched sections keep their defaults
        assert_eq!(settings.database.member_collection, "members");
        assert_eq!(settings.templates.index_key, "index");
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.database.name = "staging".to_string();
        settings.server.bind = "127.0.0.1:9999".to_string();

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.database.name, "staging");
        assert_eq!(loaded.server.bind, "127.0.0.1:9999");
    }

    #[test]
    fn test_resolve_uri_prefers_inline_value() {
        let config = DatabaseConfig {
            uri: Some("mongodb://inline".to_string()),
            uri_file: Some(PathBuf::from("/does/not/exist")),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.resolve_uri().unwrap(), "mongodb://inline");
    }

    #[test]
    fn test_resolve_uri_reads_secret_file() {
        let temp_dir = TempDir::new().unwrap();
        let secret = temp_dir.path().join("MONGO_URI");
        fs::write(&secret, "mongodb://from-secret\n").unwrap();

        let config = DatabaseConfig {
            uri_file: Some(secret),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.resolve_uri().unwrap(), "mongodb://from-secret");
    }

    #[test]
    fn test_resolve_uri_errors() {
        let config = DatabaseConfig::default();
        assert!(matches!(config.resolve_uri(), Err(ConfigError::MissingDatabaseUri)));

        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("EMPTY");
        fs::write(&empty, "  \n").unwrap();
        let config = DatabaseConfig {
            uri_file: Some(empty),
            ..DatabaseConfig::default()
        };
        assert!(matches!(config.resolve_uri(), Err(ConfigError::SecretEmpty { .. })));

        let config = DatabaseConfig {
            uri_file: Some(temp_dir.path().join("missing")),
            ..DatabaseConfig::default()
        };
        assert!(matches!(
            config.resolve_uri(),
            Err(ConfigError::SecretUnreadable { .. })
        ));
    }

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("0.0.0.0:8080", "3000"), "0.0.0.0:3000");
        assert_eq!(with_port("[::1]:8080", "3000"), "[::1]:3000");
        assert_eq!(with_port("0.0.0.0:8080", "not-a-port"), "0.0.0.0:8080");
    }

    #[test]
    fn test_with_port_host_without_port() {
        assert_eq!(with_port("[::1]", "3000"), "[::1]:3000");
        assert_eq!(with_port("::1", "3000"), "[::1]:3000");
        assert_eq!(with_port("localhost", "3000"), "localhost:3000");
        assert_eq!(with_port("localhost:80", "3000"), "localhost:3000");
    }
}
