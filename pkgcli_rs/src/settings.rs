//! Settings storage.
//!
//! Commands read and write sectioned key/value settings through
//! [`SettingsStore`]. The shipped implementation keeps them in a TOML file:
//!
//! ```toml
//! [config]
//! globalPackagesFolder = "/home/me/.pkgcli/packages"
//!
//! [packageSources]
//! local = "/srv/feed"
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::cli::CommandError;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "PKGCLI_CONFIG";

/// File name used under the user configuration directory.
pub const CONFIG_FILE_NAME: &str = "pkgcli.toml";

/// Well-known section names.
pub mod sections {
    pub const CONFIG: &str = "config";
    pub const PACKAGE_SOURCES: &str = "packageSources";
    pub const DISABLED_PACKAGE_SOURCES: &str = "disabledPackageSources";
    pub const PACKAGE_SOURCE_CREDENTIALS: &str = "packageSourceCredentials";
    pub const API_KEYS: &str = "apikeys";
}

/// Sectioned key/value settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, section: &str, key: &str) -> Option<String>;

    fn set(&self, section: &str, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Returns whether it existed.
    fn remove(&self, section: &str, key: &str) -> Result<bool>;

    /// All entries of a section in stored order.
    fn entries(&self, section: &str) -> Vec<(String, String)>;

    /// File backing these settings, if any.
    fn origin(&self) -> Option<PathBuf>;
}

/// Opens the settings store for one invocation.
pub trait SettingsLoader: Send + Sync {
    /// `config_file` is the `-ConfigFile` override when given.
    fn load(&self, config_file: Option<&Path>) -> Result<Arc<dyn SettingsStore>, CommandError>;
}

type Sections = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct SettingsDocument {
    sections: Sections,
}

/// Settings persisted to a TOML file.
///
/// A missing file reads as empty and is created on the first write.
pub struct TomlSettings {
    path: PathBuf,
    document: Mutex<SettingsDocument>,
}

impl TomlSettings {
    pub fn open(path: &Path) -> Result<Self> {
        let document = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            SettingsDocument::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            document: Mutex::new(document),
        })
    }

    fn save(&self, document: &SettingsDocument) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
        let content = toml::to_string(document).context("Failed to serialize settings")?;
        let mut tmp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SettingsDocument> {
        self.document
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SettingsStore for TomlSettings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.lock().sections.get(section)?.get(key).cloned()
    }

    // Both writers edit a copy and keep it only once it is on disk.
    fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        let mut document = self.lock();
        let mut updated = document.clone();
        updated
            .sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.save(&updated)?;
        *document = updated;
        Ok(())
    }

    fn remove(&self, section: &str, key: &str) -> Result<bool> {
        let mut document = self.lock();
        let mut updated = document.clone();
        let removed = updated
            .sections
            .get_mut(section)
            .and_then(|entries| entries.shift_remove(key))
            .is_some();
        if removed {
            if updated.sections.get(section).is_some_and(IndexMap::is_empty) {
                updated.sections.shift_remove(section);
            }
            self.save(&updated)?;
            *document = updated;
        }
        Ok(removed)
    }

    fn entries(&self, section: &str) -> Vec<(String, String)> {
        self.lock()
            .sections
            .get(section)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn origin(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

/// Settings kept only in memory.
#[derive(Default)]
pub struct MemorySettings {
    sections: Mutex<Sections>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sections> {
        self.sections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.lock().get(section)?.get(key).cloned()
    }

    fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        self.lock()
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, section: &str, key: &str) -> Result<bool> {
        Ok(self
            .lock()
            .get_mut(section)
            .and_then(|entries| entries.shift_remove(key))
            .is_some())
    }

    fn entries(&self, section: &str) -> Vec<(String, String)> {
        self.lock()
            .get(section)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn origin(&self) -> Option<PathBuf> {
        None
    }
}

/// Resolves the settings file: `-ConfigFile`, then `PKGCLI_CONFIG`, then the
/// user configuration directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlSettingsLoader;

impl TomlSettingsLoader {
    pub fn resolve_path(config_file: Option<&Path>) -> Result<PathBuf, CommandError> {
        if let Some(path) = config_file {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("pkgcli").join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                CommandError::Failed(
                    "Unable to locate the user configuration directory. Pass -ConfigFile."
                        .to_string(),
                )
            })
    }
}

impl SettingsLoader for TomlSettingsLoader {
    fn load(&self, config_file: Option<&Path>) -> Result<Arc<dyn SettingsStore>, CommandError> {
        let path = Self::resolve_path(config_file)?;
        tracing::debug!(path = %path.display(), "loading settings");
        let settings = TomlSettings::open(&path)
            .map_err(|err| CommandError::Failed(format!("{:#}", err)))?;
        Ok(Arc::new(settings))
    }
}

/// Loader that always hands out the same store.
pub struct SharedSettings(pub Arc<dyn SettingsStore>);

impl SettingsLoader for SharedSettings {
    fn load(&self, _config_file: Option<&Path>) -> Result<Arc<dyn SettingsStore>, CommandError> {
        Ok(Arc::clone(&self.0))
    }
}
