//! セッション永続化モジュール
//!
//! トークンとユーザー名だけをJSONファイルに保存し、次回起動時に復元する。
//! 行データ・集計値・履歴は保存しない（起動ごとに作り直す）。

use crate::error::Result;
use chemvis_common::Session;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存済みセッションを読み込み
    ///
    /// ファイルが無い・壊れている場合は未ログインとして扱う。
    pub fn load(&self) -> Option<Session> {
        if !self.path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "failed to read session file");
                return None;
            }
        };
        match Session::from_json(&content) {
            Ok(session) if session.is_valid() => Some(session),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.path.display(), "ignoring corrupt session file");
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, session.to_json()?)?;
        tracing::debug!(path = %self.path.display(), user = %session.username, "session saved");
        Ok(())
    }

    /// セッションを削除（存在しなければfalse）
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
