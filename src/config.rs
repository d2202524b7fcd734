//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SOTW_BACK_CONFIG_PATH";

const DEFAULT_TRACK_URI_PREFIX: &str = "spotify:track:";
const DEFAULT_TIMEZONE: &str = "America/New_York";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    track_uri_prefix: String,
    default_timezone: String,
    public_playlists: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        timezone = %app_config.default_timezone,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// URI of a track on the music service, e.g. `spotify:track:{id}`.
    pub fn track_uri(&self, track_id: &str) -> String {
        format!("{}{}", self.track_uri_prefix, track_id)
    }

    /// Timezone applied to schedules created without one.
    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    /// Whether playlists created on the music service are public.
    pub fn public_playlists(&self) -> bool {
        self.public_playlists
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            track_uri_prefix: DEFAULT_TRACK_URI_PREFIX.to_owned(),
            default_timezone: DEFAULT_TIMEZONE.to_owned(),
            public_playlists: true,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    track_uri_prefix: Option<String>,
    default_timezone: Option<String>,
    public_playlists: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            track_uri_prefix: value
                .track_uri_prefix
                .unwrap_or(defaults.track_uri_prefix),
            default_timezone: value
                .default_timezone
                .unwrap_or(defaults.default_timezone),
            public_playlists: value.public_playlists.unwrap_or(defaults.public_playlists),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
