use crate::error::{RenamerError, Result};
use crate::naming::NamingRules;
use crate::normalizer::vocabulary::{default_document_types, default_issuers};
use crate::normalizer::{CanonicalVocabulary, LabelMap};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "DIFY_API_KEY";
pub const ENV_API_URL: &str = "DIFY_API_URL";

/// 起動時に一度だけ読み込む設定。以降は読み取り専用
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dify: DifySettings,
    pub file_processing: FileProcessing,
    pub naming_rules: NamingRules,
    pub issuers: LabelMap,
    pub document_types: LabelMap,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifySettings {
    pub api_key: Option<String>,
    /// ワークフロー実行URL
    pub api_url: String,
    pub base_url: String,
    pub user_id: String,
    pub timeout_seconds: u64,
}

impl Default for DifySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.dify.ai/v1/workflows/run".into(),
            base_url: "https://api.dify.ai/v1".into(),
            user_id: "pdf-renamer-user".into(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessing {
    pub output_folder: PathBuf,
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for FileProcessing {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("output"),
            max_file_size_mb: 15,
            allowed_extensions: vec![".pdf".into(), ".PDF".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// tracing の EnvFilter 書式（例: `info`, `pdf_renamer=debug`）
    pub level: String,
    /// 指定時は標準エラーに加えてこのファイルにも追記する
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// ログファイルを追記モードで開く（親フォルダは作成）。未指定なら None
    pub fn open_log_file(&self) -> Result<Option<File>> {
        let Some(path) = &self.file else {
            return Ok(None);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RenamerError::storage(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| RenamerError::storage(path, e))?;
        Ok(Some(file))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dify: DifySettings::default(),
            file_processing: FileProcessing::default(),
            naming_rules: NamingRules::default(),
            issuers: default_issuers(),
            document_types: default_document_types(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// 設定ファイルを読み込み、環境変数で上書きして検証する
    ///
    /// `path` 未指定で既定パスにファイルがなければ既定値を使う。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(std::env::var(ENV_API_KEY).ok(), std::env::var(ENV_API_URL).ok());
        config.validate()?;
        Ok(config)
    }

    /// 環境変数を反映せずに読み込む（保存用）
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => {
                return Err(RenamerError::FileNotFound(p.display().to_string()));
            }
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| RenamerError::Config(format!("設定ファイルの形式が正しくありません: {}", e)))
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RenamerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("pdf-renamer").join("config.json"))
    }

    /// 空でない値のみ上書き
    pub fn apply_overrides(&mut self, api_key: Option<String>, api_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.dify.api_key = Some(key);
        }
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.dify.api_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.naming_rules.validate()?;

        if self.issuers.is_empty() || self.document_types.is_empty() {
            return Err(RenamerError::Config("issuers / document_types が空です".into()));
        }
        if self.file_processing.allowed_extensions.is_empty() {
            return Err(RenamerError::Config("allowed_extensions が空です".into()));
        }
        if self.file_processing.max_file_size_mb == 0 {
            return Err(RenamerError::Config("max_file_size_mb は1以上にしてください".into()));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> CanonicalVocabulary {
        CanonicalVocabulary {
            issuers: self.issuers.clone(),
            document_types: self.document_types.clone(),
        }
    }

    pub fn set_api_key(&mut self, key: String, path: Option<&Path>) -> Result<()> {
        self.dify.api_key = Some(key);
        self.save(path)
    }

    /// 表示用（先頭のみ）
    pub fn masked_api_key(&self) -> String {
        match &self.dify.api_key {
            Some(key) if !key.is_empty() => {
                let head: String = key.chars().take(6).collect();
                format!("{}...", head)
            }
            _ => "未設定".into(),
        }
    }
}
