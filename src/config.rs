use crate::error::{ChemVisError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
const BASE_URL_ENV: &str = "CHEMVIS_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// バックエンドのベースURL（/api まで）
    pub base_url: String,
    /// Authorizationヘッダのスキーム
    pub auth_scheme: String,
    /// セッション保存先（省略時は設定ディレクトリ）
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default_config()
        };

        // 環境変数を優先
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ChemVisError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("chemvis"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// セッションファイルのパス
    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("session.json")),
        }
    }

    fn default_config() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            auth_scheme: "Token".into(),
            session_file: None,
        }
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        let trimmed = url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ChemVisError::Config(format!(
                "base URL must start with http:// or https://: {}",
                url
            )));
        }
        self.base_url = trimmed.trim_end_matches('/').to_string();
        self.save()
    }
}
