//! Application-level configuration loading: key lengths, expiry and persistence timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::keys::{MAX_SESSION_KEY_LENGTH, MIN_GAME_ID_LENGTH, MIN_SESSION_KEY_LENGTH};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZ_BACK_CONFIG_PATH";

const DEFAULT_IDLE_GAME_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 250;
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Length of generated game IDs, never below [`MIN_GAME_ID_LENGTH`].
    pub game_id_length: usize,
    /// Length of generated session keys, clamped to the accepted key range.
    pub session_key_length: usize,
    /// Games untouched for this long are evicted; `None` keeps them forever.
    pub idle_game_ttl: Option<Duration>,
    /// Period of the idle-game sweeper.
    pub expiry_sweep_interval: Duration,
    /// Delay used to coalesce bursts of writes to the storage backend.
    pub persist_debounce: Duration,
    /// Slots of each per-game SSE broadcast channel.
    pub sse_capacity: usize,
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
                        game_id_length = app_config.game_id_length,
                        idle_game_ttl = ?app_config.idle_game_ttl,
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
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    game_id_length: usize,
    session_key_length: usize,
    idle_game_ttl_secs: u64,
    expiry_sweep_interval_secs: u64,
    persist_debounce_ms: u64,
    sse_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            game_id_length: MIN_GAME_ID_LENGTH,
            session_key_length: MIN_SESSION_KEY_LENGTH,
            idle_game_ttl_secs: DEFAULT_IDLE_GAME_TTL_SECS,
            expiry_sweep_interval_secs: DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS,
            persist_debounce_ms: DEFAULT_PERSIST_DEBOUNCE_MS,
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            game_id_length: value.game_id_length.max(MIN_GAME_ID_LENGTH),
            session_key_length: value
                .session_key_length
                .clamp(MIN_SESSION_KEY_LENGTH, MAX_SESSION_KEY_LENGTH),
            idle_game_ttl: (value.idle_game_ttl_secs > 0)
                .then(|| Duration::from_secs(value.idle_game_ttl_secs)),
            expiry_sweep_interval: Duration::from_secs(value.expiry_sweep_interval_secs.max(1)),
            persist_debounce: Duration::from_millis(value.persist_debounce_ms),
            sse_capacity: value.sse_capacity.max(1),
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
