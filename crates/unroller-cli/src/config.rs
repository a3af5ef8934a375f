//! Configuration for the content unroller service.
//!
//! Provides the [`UnrollerConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `UNROLLER_CONFIG` environment variable
//! 3. XDG default: `~/.config/content-unroller/config.toml`
//! 4. Built-in defaults

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use confyg::{Confygery, env};
use serde::{Deserialize, Deserializer, Serialize, de};
use unroller_core::{Error, Result};

/// Prefix of every environment variable the service reads.
pub const ENV_PREFIX: &str = "UNROLLER";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "UNROLLER_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnrollerConfig {
    /// Host used in the ids of stubs for unresolved content.
    pub api_host: String,

    /// Listen address.
    pub server: ServerConfig,

    /// Batch content API.
    pub content_store: ContentStoreConfig,

    /// Per-item preview API.
    pub content_preview: ContentPreviewConfig,

    /// Upstream paths.
    pub paths: PathsConfig,

    /// Outbound HTTP behaviour.
    pub http: HttpConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(deserialize_with = "string_or_value")]
    pub port: u16,

    /// Host address to bind to.
    pub host: String,
}

/// The batch content API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    /// Application name, for logs and health checks.
    pub app_name: String,

    /// Base URL.
    pub host: String,
}

/// The per-item preview API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPreviewConfig {
    /// Application name, for logs and health checks.
    pub app_name: String,

    /// Base URL.
    pub host: String,
}

/// Paths appended to the upstream base URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Published content.
    pub content: String,

    /// Internal components.
    pub internal_content: String,
}

/// Outbound HTTP configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Deadline of each upstream call, in seconds.
    #[serde(deserialize_with = "string_or_value")]
    pub timeout_secs: u64,

    /// Attempts per batch call, including the first. 1 disables retries.
    #[serde(deserialize_with = "string_or_value")]
    pub max_attempts: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON log lines.
    #[serde(deserialize_with = "string_or_value")]
    pub json: bool,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for UnrollerConfig {
    fn default() -> Self {
        Self {
            api_host: "test.api.ft.com".to_string(),
            server: ServerConfig::default(),
            content_store: ContentStoreConfig::default(),
            content_preview: ContentPreviewConfig::default(),
            paths: PathsConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9090,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            app_name: "content-public-read".to_string(),
            host: "http://localhost:8080/__content-public-read".to_string(),
        }
    }
}

impl ContentStoreConfig {
    /// `{host}{path}`, without doubled slashes.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.host, path)
    }
}

impl Default for ContentPreviewConfig {
    fn default() -> Self {
        Self {
            app_name: "content-public-read-preview".to_string(),
            host: "http://localhost:8080/__content-preview".to_string(),
        }
    }
}

impl ContentPreviewConfig {
    /// `{host}{path}`, without doubled slashes.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.host, path)
    }
}

fn join_url(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "/content".to_string(),
            internal_content: "/internalcontent".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 1,
        }
    }
}

impl HttpConfig {
    /// The per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl UnrollerConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("server");
        env_opts.add_section("content_store");
        env_opts.add_section("content_preview");
        env_opts.add_section("paths");
        env_opts.add_section("http");
        env_opts.add_section("logging");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        Self::build(&mut builder)
    }

    fn build(builder: &mut Confygery) -> Result<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_host.trim().is_empty() {
            return Err(Error::config("api_host must not be empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be greater than 0"));
        }
        for (name, host) in [
            ("content_store", &self.content_store.host),
            ("content_preview", &self.content_preview.host),
        ] {
            if !host.starts_with("http://") && !host.starts_with("https://") {
                return Err(Error::config(format!(
                    "{name}.host must be an http(s) URL, got '{host}'"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("content-unroller").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `UNROLLER_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, ENV_PREFIX, &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// Helper: scalars from environment strings
// ============================================================================

/// Accepts a scalar either natively or as a string.
///
/// Environment overrides reach the TOML layer as strings, so `port = '9191'`
/// must load the same as `port = 9191`.
fn string_or_value<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar<V> {
        Value(V),
        Text(String),
    }

    match Scalar::<T>::deserialize(deserializer)? {
        Scalar::Value(value) => Ok(value),
        Scalar::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid value '{text}': {e}"))),
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_unroller_config_default() {
        let config = UnrollerConfig::default();
        assert_eq!(config.api_host, "test.api.ft.com");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.content_store.app_name, "content-public-read");
        assert_eq!(config.paths.content, "/content");
        assert_eq!(config.paths.internal_content, "/internalcontent");
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
        assert_eq!(config.http.max_attempts, 1);
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unroller_config_from_toml() {
        let toml_str = r#"
            api_host = "api.ft.com"

            [server]
            port = 8080

            [content_store]
            app_name = "cpr"
            host = "http://cpr:8080"

            [http]
            timeout_secs = 3
            max_attempts = 2
        "#;

        let config: UnrollerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_host, "api.ft.com");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.content_store.host, "http://cpr:8080");
        assert_eq!(config.content_preview, ContentPreviewConfig::default());
        assert_eq!(config.http.timeout_secs, 3);
        assert_eq!(config.http.max_attempts, 2);
    }

    #[test]
    fn test_unroller_config_to_toml() {
        let config = UnrollerConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("api_host = \"test.api.ft.com\""));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("port = 9090"));

        let parsed: UnrollerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unroller_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                api_host = "api.ft.com"
                [server]
                port = 9191
                [logging]
                json = true
            "#,
        )
        .unwrap();

        let config = UnrollerConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.api_host, "api.ft.com");
        assert_eq!(config.server.port, 9191);
        assert!(config.logging.json);
    }

    #[test]
    fn test_unroller_config_load_defaults() {
        let config = UnrollerConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_unroller_config_load_keeps_defaults_under_empty_sections() {
        let mut builder = Confygery::new().unwrap();
        builder
            .add_str("api_host = 'api.ft.com'\n\n[content_store]\n\n[content_preview]\n")
            .unwrap();

        let config = UnrollerConfig::build(&mut builder).unwrap();
        assert_eq!(config.content_store, ContentStoreConfig::default());
        assert_eq!(config.content_preview, ContentPreviewConfig::default());
    }

    #[test]
    fn test_unroller_config_load_partial_upstream_section() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[content_preview]\nhost = \"http://preview:8080\"\n").unwrap();

        let config = UnrollerConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.content_preview.host, "http://preview:8080");
        assert_eq!(config.content_preview.app_name, "content-public-read-preview");
        assert_eq!(config.content_store, ContentStoreConfig::default());
    }

    #[test]
    fn test_unroller_config_scalars_from_env_strings() {
        // The shape confyg gives UNROLLER_SERVER_PORT=9191 and friends.
        let mut builder = Confygery::new().unwrap();
        builder
            .add_str(
                "[server]\nport = '9191'\n\n[http]\nmax_attempts = '3'\ntimeout_secs = ' 4 '\n\n[logging]\njson = 'true'\n",
            )
            .unwrap();

        let config = UnrollerConfig::build(&mut builder).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.http.max_attempts, 3);
        assert_eq!(config.http.timeout_secs, 4);
        assert!(config.logging.json);
    }

    #[test]
    fn test_unroller_config_exported_env_loads_back() {
        let mut config = UnrollerConfig::default();
        config.server.port = 9191;
        config.http.max_attempts = 2;
        config.logging.json = true;

        let mut sections: Vec<(&str, Vec<String>)> = vec![
            ("server", Vec::new()),
            ("http", Vec::new()),
            ("logging", Vec::new()),
        ];
        for (key, value) in config.to_env_vars().unwrap() {
            for (section, lines) in &mut sections {
                let prefix = format!("UNROLLER_{}_", section.to_uppercase());
                if let Some(field) = key.strip_prefix(&prefix) {
                    lines.push(format!("{} = '{value}'", field.to_lowercase()));
                }
            }
        }
        let env_toml: String = sections
            .iter()
            .map(|(section, lines)| format!("[{section}]\n{}\n", lines.join("\n")))
            .collect();

        let mut builder = Confygery::new().unwrap();
        builder.add_str(&env_toml).unwrap();
        let loaded = UnrollerConfig::build(&mut builder).unwrap();
        assert_eq!(loaded.server, config.server);
        assert_eq!(loaded.http, config.http);
        assert_eq!(loaded.logging, config.logging);
    }

    #[test]
    fn test_unroller_config_rejects_non_numeric_port() {
        let mut builder = Confygery::new().unwrap();
        builder.add_str("[server]\nport = 'http'\n").unwrap();

        let err = UnrollerConfig::build(&mut builder).unwrap_err();
        assert!(err.to_string().contains("invalid value 'http'"));
    }

    #[test]
    fn test_unroller_config_load_rejects_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\ntimeout_secs = 0\n").unwrap();

        let err = UnrollerConfig::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_upstream_host() {
        let mut config = UnrollerConfig::default();
        config.content_preview.host = "localhost:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = UnrollerConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_upstream_url() {
        let upstream = ContentStoreConfig {
            app_name: "x".to_string(),
            host: "http://localhost:8080/__content-public-read/".to_string(),
        };
        assert_eq!(
            upstream.url("/content"),
            "http://localhost:8080/__content-public-read/content"
        );
        assert_eq!(
            upstream.url("internalcontent"),
            "http://localhost:8080/__content-public-read/internalcontent"
        );
    }

    #[test]
    fn test_unroller_config_to_env_vars() {
        let config = UnrollerConfig::default();
        let vars = config.to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("UNROLLER_API_HOST").unwrap(), "test.api.ft.com");
        assert_eq!(map.get("UNROLLER_SERVER_PORT").unwrap(), "9090");
        assert_eq!(
            map.get("UNROLLER_CONTENT_STORE_APP_NAME").unwrap(),
            "content-public-read"
        );
        assert_eq!(map.get("UNROLLER_HTTP_MAX_ATTEMPTS").unwrap(), "1");
    }

    #[test]
    fn test_unroller_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UnrollerConfig>();
    }
}
