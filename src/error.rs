use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenamerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`pdf-renamer config --set-api-key YOUR_KEY` または環境変数 DIFY_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("PDFファイルが見つかりません: {0}")]
    NoPdfFound(String),

    #[error("対応していないファイル形式です: {0}")]
    UnsupportedFile(String),

    #[error("ファイルサイズが大きすぎます: {name} ({size_mb:.2}MB / 上限 {limit_mb}MB)")]
    FileTooLarge {
        name: String,
        size_mb: f64,
        limit_mb: u64,
    },

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("情報抽出に失敗: {0}")]
    Extraction(String),

    #[error("ストレージエラー ({}): {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("不正な保存ファイル名: {0}")]
    InvalidStoredName(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl RenamerError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenamerError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenamerError>;
