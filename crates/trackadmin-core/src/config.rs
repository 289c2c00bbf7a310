//! Configuration loaded from `~/.trackadmin/config.toml`.
//!
//! Every section has defaults so an absent or partial file is valid. A few
//! environment variables override the file, matching what the tracking
//! server itself reads (`HOST`, `PORT`, `INTERNAL_SECRET`, `JWT_SECRET`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TrackAdminError};

/// Secret the tracking server falls back to when none is configured.
pub const DEFAULT_INTERNAL_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackAdminConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use https/wss instead of http/ws.
    #[serde(default)]
    pub tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Raw `Cookie` header value of an admin session (e.g. `token=...`).
    #[serde(default)]
    pub session_cookie: Option<String>,
    /// Shared secret for `/api/internal/admin/*`.
    #[serde(default = "default_secret")]
    pub internal_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Explicit WebSocket URL; derived from the server address when unset.
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Tracker SQLite database, used only by direct privilege writes.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_host() -> String { "localhost".into() }
fn default_port() -> u16 { 3000 }
fn default_secret() -> String { DEFAULT_INTERNAL_SECRET.into() }
fn default_reconnect_delay_secs() -> u64 { 3 }
fn default_db_path() -> String { "./database.db".into() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), tls: false }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { session_cookie: None, internal_secret: default_secret() }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self { ws_url: None, reconnect_delay_secs: default_reconnect_delay_secs() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

impl TrackAdminConfig {
    /// `~/.trackadmin/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trackadmin")
            .join("config.toml")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| TrackAdminError::Config(format!("{}: {e}", path.display())))
    }

    /// Load the file at `path` (else `$TRACKADMIN_CONFIG`, else the default
    /// path), tolerate its absence, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("TRACKADMIN_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_path);
        let mut config = if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{port}'"),
            }
        }
        // Empty values fall through to the next source.
        let secret = lookup("INTERNAL_SECRET")
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("JWT_SECRET").filter(|v| !v.is_empty()));
        if let Some(secret) = secret {
            self.auth.internal_secret = secret;
        }
        if let Some(cookie) = lookup("TRACKADMIN_SESSION").filter(|v| !v.is_empty()) {
            self.auth.session_cookie = Some(cookie);
        }
        if let Some(db) = lookup("TRACKADMIN_DB").filter(|v| !v.is_empty()) {
            self.database.path = db;
        }
    }

    /// Base URL of the tracking server, without trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.server.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.server.host, self.server.port)
    }

    pub fn ws_url(&self) -> String {
        self.realtime
            .ws_url
            .clone()
            .unwrap_or_else(|| ws_url_from_base(&self.base_url()))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.realtime.reconnect_delay_secs)
    }
}

/// Derive the realtime endpoint from an HTTP base URL.
///
/// The server accepts WebSocket upgrades on its root, so any path is dropped.
pub fn ws_url_from_base(base: &str) -> String {
    let (scheme, rest) = match base.split_once("://") {
        Some(("https", rest)) => ("wss", rest),
        Some((_, rest)) => ("ws", rest),
        None => ("ws", base),
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{authority}")
}
