//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use ff_api::{ApiError, Endpoints};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL the endpoint paths are resolved against.
    pub server_url: String,
    /// Login form endpoint, relative to `server_url`.
    pub login_path: String,
    /// Default settings endpoint, relative to `server_url`.
    pub settings_path: String,
    /// Telemetry endpoint, relative to `server_url`.
    pub track_path: String,
    /// Account name used when `--username` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("login_path", &self.login_path)
            .field("settings_path", &self.settings_path)
            .field("track_path", &self.track_path)
            .field("username", &self.username)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost/FocusFlow/public".to_string(),
            login_path: "login.php".to_string(),
            settings_path: "api/get_settings.php".to_string(),
            track_path: "api/track.php".to_string(),
            username: None,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FOCUSFLOW_*)
        figment = figment.merge(Env::prefixed("FOCUSFLOW_"));

        figment.extract()
    }

    /// Resolves the endpoint URLs.
    pub fn endpoints(&self) -> Result<Endpoints, ApiError> {
        Endpoints::new(
            &self.server_url,
            &self.login_path,
            &self.settings_path,
            &self.track_path,
        )
    }
}

/// Returns the platform-specific config directory for focusflow.
///
/// On Linux: `~/.config/focusflow`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("focusflow"))
}
