use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::identity::Identity;

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// アプリ名（ショートカットのファイル名にも使う）
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// AUMI（Application User Model ID）
    #[serde(default = "default_aumi")]
    pub aumi: String,
    /// ショートカットの配置先（未指定ならスタートメニュー）
    #[serde(default)]
    pub shortcut_dir: Option<PathBuf>,
    /// ログレベル
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 通知の有効期限（秒、0で無期限）
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,
    /// CLIが結果を待つ秒数
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
}

fn default_app_name() -> String {
    "ToastNotifier".to_string()
}

fn default_aumi() -> String {
    "ToastNotifier.ID".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_expiration_secs() -> u64 {
    60
}

fn default_wait_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            aumi: default_aumi(),
            shortcut_dir: None,
            log_level: default_log_level(),
            expiration_secs: default_expiration_secs(),
            wait_secs: default_wait_secs(),
        }
    }
}

impl Config {
    /// 設定を読み込む（ファイルがなければデフォルトで作成）
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!("Failed to save default config: {}", e);
            }
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
    }

    /// `~/.config/toast-notifier/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
        Ok(base_dirs.home_dir().join(".config/toast-notifier/config.toml"))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn identity(&self) -> Identity {
        let identity = Identity::new(self.app_name.clone(), self.aumi.clone());
        match &self.shortcut_dir {
            Some(dir) => identity.with_shortcut_dir(dir.clone()),
            None => identity,
        }
    }
}
