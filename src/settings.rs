use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::context::ContextKind;

const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_SHELL_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitSearchSettings {
    /// Directories scanned for a repository, in order.
    pub search_roots: Vec<PathBuf>,
    pub max_depth: usize,
    /// Non-hidden entries examined per directory level.
    pub max_entries_per_dir: usize,
}

impl Default for GitSearchSettings {
    fn default() -> Self {
        let search_roots = dirs::home_dir()
            .map(|home| {
                ["Desktop", "Documents", "Developer"]
                    .iter()
                    .map(|dir| home.join(dir))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            search_roots,
            max_depth: 2,
            max_entries_per_dir: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureSettings {
    pub provider_timeout_ms: u64,
    pub shell_timeout_ms: u64,
    pub git: GitSearchSettings,
    pub disabled_providers: Vec<ContextKind>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            shell_timeout_ms: DEFAULT_SHELL_TIMEOUT_MS,
            git: GitSearchSettings::default(),
            disabled_providers: Vec::new(),
        }
    }
}

impl CaptureSettings {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_millis(self.shell_timeout_ms)
    }

    pub fn is_enabled(&self, kind: ContextKind) -> bool {
        !self.disabled_providers.contains(&kind)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CaptureSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!(
                        "Ignoring unreadable settings at {}: {err}",
                        path.display()
                    );
                    CaptureSettings::default()
                }
            }
        } else {
            CaptureSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> CaptureSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: CaptureSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CaptureSettings =
            serde_json::from_str(&contents).context("Failed to parse settings")?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &CaptureSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let settings = store.current();
        assert_eq!(settings.provider_timeout_ms, 2_000);
        assert_eq!(settings.git.max_depth, 2);
        assert_eq!(settings.git.max_entries_per_dir, 10);
        assert!(settings.is_enabled(ContextKind::Media));
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.current();
        settings.provider_timeout_ms = 500;
        settings.disabled_providers = vec![ContextKind::Media];
        store.update(settings).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        let current = reopened.current();
        assert_eq!(current.provider_timeout(), Duration::from_millis(500));
        assert!(!current.is_enabled(ContextKind::Media));
        assert!(current.is_enabled(ContextKind::Git));
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "shellTimeoutMs": 750 }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let settings = store.current();
        assert_eq!(settings.shell_timeout_ms, 750);
        assert_eq!(settings.provider_timeout_ms, 2_000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.current(), CaptureSettings::default());
    }
}
