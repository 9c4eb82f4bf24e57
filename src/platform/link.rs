//! File-backed identity shortcuts stored as TOML

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ShortcutStore;
use crate::error::PlatformError;

/// Persisted shortcut contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutFile {
    /// Executable the shortcut launches
    pub target: PathBuf,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub arguments: String,
    /// Application user model id property
    #[serde(default)]
    pub app_user_model_id: Option<String>,
}

impl ShortcutFile {
    pub fn load(path: &Path) -> Result<Self, PlatformError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PlatformError::MalformedShortcut {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PlatformError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| PlatformError::MalformedShortcut {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// [`ShortcutStore`] writing one TOML file per shortcut
#[derive(Debug, Clone, Default)]
pub struct FileShortcutStore;

impl FileShortcutStore {
    pub fn new() -> Self {
        Self
    }
}

impl ShortcutStore for FileShortcutStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_identity(&self, path: &Path) -> Result<String, PlatformError> {
        ShortcutFile::load(path)?
            .app_user_model_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::MissingIdentity(path.to_path_buf()))
    }

    fn write_identity(&self, path: &Path, aumi: &str) -> Result<(), PlatformError> {
        let mut shortcut = ShortcutFile::load(path)?;
        if shortcut.app_user_model_id.as_deref() == Some(aumi) {
            debug!("Shortcut {} already carries {}", path.display(), aumi);
            return Ok(());
        }
        shortcut.app_user_model_id = Some(aumi.to_string());
        shortcut.save(path)
    }

    fn create(
        &self,
        path: &Path,
        target: &Path,
        working_dir: &Path,
        aumi: &str,
    ) -> Result<(), PlatformError> {
        ShortcutFile {
            target: target.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            arguments: String::new(),
            app_user_model_id: Some(aumi.to_string()),
        }
        .save(path)
    }
}
