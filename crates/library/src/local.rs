use anyhow::{Context, Result};
use playbar_core::{Playlist, Settings};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub const PLAYLISTS_KEY: &str = "playlists";
pub const SETTINGS_KEY: &str = "settings";

/// Durable key-value storage on the local device.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(data))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Missing or unreadable data degrades to an empty collection.
pub fn read_playlists(store: &dyn LocalStore) -> Vec<Playlist> {
    match store.get(PLAYLISTS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored playlists are corrupt; starting empty");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(error = %err, "failed to read stored playlists");
            Vec::new()
        }
    }
}

pub fn write_playlists(store: &dyn LocalStore, playlists: &[Playlist]) -> Result<()> {
    let raw = serde_json::to_string(playlists)?;
    store.set(PLAYLISTS_KEY, &raw)
}

pub fn read_settings(store: &dyn LocalStore) -> Settings {
    match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored settings are corrupt; using defaults");
            Settings::default()
        }),
        Ok(None) => Settings::default(),
        Err(err) => {
            warn!(error = %err, "failed to read stored settings");
            Settings::default()
        }
    }
}

pub fn write_settings(store: &dyn LocalStore, settings: &Settings) -> Result<()> {
    let raw = serde_json::to_string(settings)?;
    store.set(SETTINGS_KEY, &raw)
}
