use thiserror::Error;

/// CLI全体のエラー
///
/// Display はそのまま利用者に表示するメッセージ。
#[derive(Error, Debug)]
pub enum ChemVisError {
    #[error("Config error: {0}")]
    Config(String),

    /// 入力不足（バックエンドには送信しない）
    #[error("{0}")]
    Validation(String),

    /// 通信失敗。詳細はログにのみ出す
    #[error("Connection to backend failed.")]
    Connection(String),

    /// バックエンドが返したエラー（`error` フィールド、無ければ本文そのまま）
    #[error("Error: {message}")]
    Backend { status: u16, message: String },

    #[error("Session expired or invalid. Please log out and log in again.")]
    SessionExpired,

    #[error("Not logged in. Run `chemvis login` first.")]
    NotAuthenticated,

    #[error("Unexpected response from backend: {0}")]
    ResponseParse(String),

    #[error("History entry has no id: {0}")]
    HistoryEntryWithoutId(String),

    #[error("Nothing to export. Upload a CSV file or open a history entry first.")]
    NothingToExport,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),

    #[error("Excel generation failed: {0}")]
    ExcelGeneration(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Common(#[from] chemvis_common::Error),
}

impl ChemVisError {
    /// 認証切れ（ログアウト→再ログインを促す）
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ChemVisError::SessionExpired)
    }
}

pub type Result<T> = std::result::Result<T, ChemVisError>;
