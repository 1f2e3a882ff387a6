use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client-side state that must survive a restart.
///
/// Persisted to `~/.dropdeck/session.json`. The wizard writes the app id it
/// is building so an interrupted flow can be resumed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub in_progress_app_id: Option<String>,
    pub selected_app_id: Option<String>,
}

impl SessionState {
    /// Load from `path`. Missing or corrupt files yield the default state.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session: {}", path.display()))?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save session: {}", path.display()))
    }

    /// Read-modify-write helper that keeps unrelated fields intact.
    pub fn update(path: &Path, f: impl FnOnce(&mut Self)) -> Result<Self> {
        let mut state = Self::load_from(path).unwrap_or_default();
        f(&mut state);
        state.save_to(path)?;
        Ok(state)
    }
}
