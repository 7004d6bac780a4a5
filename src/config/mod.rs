//! Configuration management.
//!
//! Settings come from an optional TOML file (`$JOBTRAIL_CONFIG`, falling
//! back to the platform config dir) with environment variable overrides on
//! top, so a containerized deployment can run without any file at all.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::info;

use crate::error::{JobtrailError, Result};

/// Global configuration instance
static CONFIG: OnceCell<RwLock<AppConfig>> = OnceCell::new();

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub google: GoogleConfig,

    /// Origin allowed by CORS and redirected to after OAuth completes.
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,

    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Bind address for the HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Google OAuth2 client registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,

    /// Optional for public clients using PKCE
    pub client_secret: Option<String>,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

/// Bounds for one refresh pass against the mail provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Upper bound on message ids requested per pass
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Recency filter: only messages newer than this many days
    #[serde(default = "default_newer_than_days")]
    pub newer_than_days: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_frontend_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/auth/google/callback".to_string()
}

fn default_max_results() -> u32 {
    100
}

fn default_newer_than_days() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            newer_than_days: default_newer_than_days(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: default_redirect_uri(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            google: GoogleConfig::default(),
            frontend_origin: default_frontend_origin(),
            refresh: RefreshConfig::default(),
        }
    }
}

/// Resolve the config file path: `$JOBTRAIL_CONFIG` wins, otherwise the
/// platform config dir.
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("JOBTRAIL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("jobtrail").join("config.toml"))
}

/// Load configuration from disk (if present) and environment, and install
/// it as the process-global instance. Idempotent; later calls keep the
/// first loaded value.
pub fn init_config() -> Result<()> {
    let mut config = match config_path() {
        Some(path) if path.exists() => {
            let raw = fs::read_to_string(&path)
                .map_err(|e| JobtrailError::Config(format!("failed to read {:?}: {}", path, e)))?;
            let parsed: AppConfig = toml::from_str(&raw)
                .map_err(|e| JobtrailError::Config(format!("failed to parse {:?}: {}", path, e)))?;
            info!("Loaded configuration from {:?}", path);
            parsed
        }
        _ => AppConfig::default(),
    };

    apply_env_overrides(&mut config);

    let _ = CONFIG.set(RwLock::new(config));
    Ok(())
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = std::env::var("JOBTRAIL_HOST") {
        config.server.host = v;
    }
    if let Ok(v) = std::env::var("PORT") {
        if let Ok(port) = v.parse() {
            config.server.port = port;
        }
    }
    if let Ok(v) = std::env::var("JOBTRAIL_GOOGLE_CLIENT_ID") {
        config.google.client_id = v;
    }
    if let Ok(v) = std::env::var("JOBTRAIL_GOOGLE_CLIENT_SECRET") {
        config.google.client_secret = Some(v);
    }
    if let Ok(v) = std::env::var("JOBTRAIL_REDIRECT_URI") {
        config.google.redirect_uri = v;
    }
    if let Ok(v) = std::env::var("JOBTRAIL_FRONTEND_ORIGIN") {
        config.frontend_origin = v;
    }
}

/// Get a copy of the current configuration.
pub fn get() -> Result<AppConfig> {
    let lock = CONFIG
        .get()
        .ok_or_else(|| JobtrailError::Config("config not initialized".to_string()))?;
    let guard = lock
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(guard.clone())
}
