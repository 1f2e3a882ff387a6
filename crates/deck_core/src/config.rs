use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::secure_storage::{SALT_FILENAME, SecureStorage};

pub const DEFAULT_TX_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

const CONFIG_FILENAME: &str = "config.json";
const KEYS_FILENAME: &str = "keys.enc";

/// Storage key for one environment's API key inside `keys.enc`.
fn key_slot(env: &str) -> String {
    format!("api_key:{env}")
}

/// Load the sealed key map. Missing or unreadable files yield an empty map.
fn load_key_map(path: &Path) -> HashMap<String, String> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save_key_map(path: &Path, map: &HashMap<String, String>) -> Result<()> {
    let content = serde_json::to_string_pretty(map)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write key store: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("failed to restrict key store permissions")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// DeckConfig
// ---------------------------------------------------------------------------

/// One backend environment (e.g. `staging`, `production`).
///
/// The API key is never serialized into `config.json`; [`ConfigManager`]
/// keeps it sealed in `keys.enc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    pub base_url: String,
    #[serde(skip)]
    pub api_key: String,
}

/// Operator settings stored at `~/.dropdeck/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub environments: BTreeMap<String, Environment>,
    pub selected_env: Option<String>,
    pub log_level: String,
    pub tx_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            environments: BTreeMap::new(),
            selected_env: None,
            log_level: "info".into(),
            tx_timeout_secs: DEFAULT_TX_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl DeckConfig {
    /// Returns the base directory: `~/.dropdeck/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".dropdeck"))
    }

    /// Returns the logs directory: `~/.dropdeck/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the session file path: `~/.dropdeck/session.json`
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("session.json"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// The currently selected environment, if one is selected and configured.
    pub fn selected_environment(&self) -> Option<(&str, &Environment)> {
        let name = self.selected_env.as_deref()?;
        self.environments.get(name).map(|env| (name, env))
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// ConfigManager
// ---------------------------------------------------------------------------

/// Shared handle over [`DeckConfig`]. Every mutating call persists before it
/// returns, so a restart always sees the last write.
pub struct ConfigManager {
    config: Arc<RwLock<DeckConfig>>,
    secure_storage: Option<SecureStorage>,
    config_path: PathBuf,
    keys_path: PathBuf,
}

impl ConfigManager {
    /// Open the manager rooted at `~/.dropdeck/`.
    pub fn new() -> Result<Self> {
        Self::open(&DeckConfig::base_dir()?)
    }

    /// Open the manager rooted at an explicit directory.
    pub fn open(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir)
            .with_context(|| format!("Failed to create directory: {}", base_dir.display()))?;

        let config_path = base_dir.join(CONFIG_FILENAME);
        let keys_path = base_dir.join(KEYS_FILENAME);

        let secure_storage = match SecureStorage::with_salt_path(&base_dir.join(SALT_FILENAME)) {
            Ok(ss) => Some(ss),
            Err(e) => {
                warn!("SecureStorage init failed ({e}); API keys will not be available");
                None
            }
        };

        let mut config = DeckConfig::load_from_path(&config_path)?;
        Self::populate_keys(&mut config, &keys_path, secure_storage.as_ref());
        info!(
            path = %config_path.display(),
            environments = config.environments.len(),
            "config loaded"
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            secure_storage,
            config_path,
            keys_path,
        })
    }

    fn populate_keys(config: &mut DeckConfig, keys_path: &Path, storage: Option<&SecureStorage>) {
        let Some(storage) = storage else { return };
        let key_map = load_key_map(keys_path);
        for (name, env) in config.environments.iter_mut() {
            env.api_key = key_map
                .get(&key_slot(name))
                .and_then(|sealed| storage.decrypt(sealed).ok())
                .unwrap_or_default();
        }
    }

    /// Snapshot of the current config, API keys included.
    pub fn get(&self) -> DeckConfig {
        self.config.read().clone()
    }

    /// The selected environment's name and settings.
    pub fn selected_environment(&self) -> Option<(String, Environment)> {
        let config = self.config.read();
        config
            .selected_environment()
            .map(|(name, env)| (name.to_string(), env.clone()))
    }

    /// Store `{base_url, api_key}` for `env`. No format checks are applied.
    pub fn set_config(&self, env: &str, base_url: &str, api_key: &str) -> Result<()> {
        self.update(|config| {
            config.environments.insert(
                env.to_string(),
                Environment {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    api_key: api_key.to_string(),
                },
            );
        })
    }

    /// Select the active environment.
    pub fn set_selected_env(&self, env: &str) -> Result<()> {
        self.update(|config| {
            if !config.environments.contains_key(env) {
                warn!(env, "selected environment has no settings yet");
            }
            config.selected_env = Some(env.to_string());
        })
    }

    /// Remove an environment. Clears the selection if it pointed there.
    pub fn remove_environment(&self, env: &str) -> Result<bool> {
        let mut removed = false;
        self.update(|config| {
            removed = config.environments.remove(env).is_some();
            if config.selected_env.as_deref() == Some(env) {
                config.selected_env = None;
            }
        })?;
        Ok(removed)
    }

    /// Mutate the config and persist both files. Keys are sealed first; if
    /// either write fails the in-memory config is left as it was.
    pub fn update(&self, f: impl FnOnce(&mut DeckConfig)) -> Result<()> {
        let mut config = self.config.write();
        let mut next = config.clone();
        f(&mut next);
        self.save_api_keys(&next)?;
        next.save_to_path(&self.config_path)?;
        *config = next;
        Ok(())
    }

    fn save_api_keys(&self, config: &DeckConfig) -> Result<()> {
        let Some(storage) = &self.secure_storage else {
            warn!("SecureStorage unavailable; API keys not persisted");
            anyhow::bail!("SecureStorage unavailable; API keys cannot be saved");
        };
        let mut key_map = HashMap::new();
        for (name, env) in &config.environments {
            if !env.api_key.is_empty() {
                key_map.insert(key_slot(name), storage.encrypt(&env.api_key)?);
            }
        }
        save_key_map(&self.keys_path, &key_map)
    }
}
