//! ダッシュボード駆動
//!
//! `AppState` を唯一の所有者として保持し、利用者の操作ごとに
//! 遷移 → バックエンド呼び出し → チケット照合 → 反映 を行う。
//! エラーは状態にも保存し（画面表示用）、呼び出し元にも返す。

use crate::cli::ExportFormat;
use crate::error::{ChemVisError, Result};
use crate::export;
use crate::gateway::{self, Backend};
use crate::session::SessionStore;
use chemvis_common::state::{MSG_MISSING_CREDENTIALS, MSG_NO_FILE};
use chemvis_common::{build_report, AppState, AuthMode, Delivery, RequestKind, Session, ViewState};
use std::path::{Path, PathBuf};

pub struct Dashboard<B: Backend> {
    state: AppState,
    backend: B,
    store: SessionStore,
}

impl<B: Backend> Dashboard<B> {
    /// 保存済みセッションを復元してIntroから開始
    pub fn start(backend: B, store: SessionStore) -> Self {
        let session = store.load();
        if let Some(s) = &session {
            tracing::debug!(user = %s.username, "session restored");
        }
        Self {
            state: AppState::startup(session),
            backend,
            store,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn apply(&mut self, transition: impl FnOnce(AppState) -> AppState) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state);
    }

    fn deliver(&mut self, transition: impl FnOnce(AppState) -> (AppState, Delivery)) -> Delivery {
        let state = std::mem::take(&mut self.state);
        let (state, delivery) = transition(state);
        self.state = state;
        if delivery == Delivery::Stale {
            tracing::debug!(generation = self.state.generation(), "discarding stale response");
        }
        delivery
    }

    fn issue<T>(&mut self, transition: impl FnOnce(AppState) -> (AppState, Option<T>)) -> Option<T> {
        let state = std::mem::take(&mut self.state);
        let (state, ticket) = transition(state);
        self.state = state;
        ticket
    }

    /// Intro → AuthForm / Dashboard（画面遷移のみ）
    pub fn enter(&mut self) {
        self.apply(AppState::proceed);
    }

    /// Intro → AuthForm / Dashboard。Dashboardに入ったら履歴を取得する
    ///
    /// 履歴取得の失敗は状態に残すだけで、遷移そのものは成功する。
    pub async fn proceed(&mut self) {
        self.enter();
        if self.state.view() == ViewState::Dashboard {
            if let Err(err) = self.refresh_history().await {
                tracing::warn!(error = %err, "initial history fetch failed");
            }
        }
    }

    pub fn toggle_mode(&mut self) {
        self.apply(AppState::toggle_mode);
    }

    /// ログイン/登録
    pub async fn submit_auth(&mut self, username: &str, password: &str) -> Result<()> {
        let ticket = self.issue(|s| s.submit_auth(username, password));
        let Some(ticket) = ticket else {
            let message = self
                .state
                .auth_error()
                .unwrap_or(MSG_MISSING_CREDENTIALS)
                .to_string();
            return Err(ChemVisError::Validation(message));
        };

        let result = match ticket.kind() {
            RequestKind::Auth(AuthMode::Register) => self.backend.register(username, password).await,
            _ => self.backend.login(username, password).await,
        };

        match result {
            Ok(response) => {
                let name = if response.username.is_empty() {
                    username.to_string()
                } else {
                    response.username
                };
                let session = Session::new(response.token, name);
                let delivery = self.deliver(|s| s.auth_succeeded(ticket, session.clone()));
                if delivery == Delivery::Applied {
                    if let Err(err) = self.store.save(&session) {
                        tracing::warn!(error = %err, "failed to persist session");
                    }
                    tracing::info!(user = %session.username, "authenticated");
                    if let Err(err) = self.refresh_history().await {
                        tracing::info!(error = %err, "initial history fetch failed");
                    }
                }
                Ok(())
            }
            Err(err) => {
                self.deliver(|s| s.auth_failed(ticket, err.to_string()));
                Err(err)
            }
        }
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::debug!(path = %path.display(), "file selected");
        self.apply(|s| s.select_file(path));
    }

    /// 選択中のファイルをアップロードして結果を表示
    pub async fn upload(&mut self) -> Result<()> {
        if self.state.session().is_none() {
            return Err(ChemVisError::NotAuthenticated);
        }
        let Some(ticket) = self.issue(AppState::begin_upload) else {
            let message = self
                .state
                .dashboard()
                .error
                .clone()
                .unwrap_or_else(|| MSG_NO_FILE.to_string());
            return Err(ChemVisError::Validation(message));
        };

        let token = self.state.token().unwrap_or_default().to_string();
        let path = self.state.dashboard().selected_file.clone().unwrap_or_default();

        match gateway::upload_file(&self.backend, &token, &path).await {
            Ok(response) => {
                tracing::info!(
                    file = %path.display(),
                    rows = response.data.len(),
                    "upload analyzed"
                );
                self.deliver(|s| s.upload_succeeded(ticket, response));
                Ok(())
            }
            Err(err) => {
                self.deliver(|s| s.upload_failed(ticket, err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn refresh_history(&mut self) -> Result<()> {
        let Some(ticket) = self.issue(AppState::begin_list_history) else {
            return Err(ChemVisError::NotAuthenticated);
        };
        let token = self.state.token().unwrap_or_default().to_string();

        match self.backend.list_history(&token).await {
            Ok(response) => {
                self.deliver(|s| s.history_loaded(ticket, response.history));
                Ok(())
            }
            Err(err) => {
                self.deliver(|s| s.history_failed(ticket, err.to_string()));
                Err(err)
            }
        }
    }

    /// 過去のアップロードを再表示
    pub async fn open_history_item(&mut self, id: i64) -> Result<()> {
        let Some(ticket) = self.issue(|s| s.begin_history_item(id)) else {
            return Err(ChemVisError::NotAuthenticated);
        };
        let token = self.state.token().unwrap_or_default().to_string();

        match self.backend.get_history_item(&token, id).await {
            Ok(response) => {
                self.deliver(|s| s.history_item_loaded(ticket, response));
                Ok(())
            }
            Err(err) => {
                self.deliver(|s| s.history_item_failed(ticket, err.to_string()));
                Err(err)
            }
        }
    }

    /// 履歴一覧のi番目を開く
    pub async fn open_history_index(&mut self, index: usize) -> Result<()> {
        let entry = self
            .state
            .dashboard()
            .history
            .get(index)
            .cloned()
            .ok_or_else(|| ChemVisError::Validation(format!("No history entry at position {}", index + 1)))?;
        let id = entry
            .id
            .ok_or_else(|| ChemVisError::HistoryEntryWithoutId(entry.file_name.clone()))?;
        self.open_history_item(id).await
    }

    /// 現在表示中のデータからレポートを出力
    pub fn export_report(&self, format: &ExportFormat, output: &Path) -> Result<Vec<PathBuf>> {
        let dashboard = self.state.dashboard();
        if dashboard.stats.is_none() && dashboard.rows.is_empty() {
            return Err(ChemVisError::NothingToExport);
        }
        let report = build_report(
            dashboard.stats.as_ref(),
            &dashboard.rows,
            chrono::Local::now().naive_local(),
        );
        export::export_report(&report, format, output)
    }

    /// セッションと表示データを消去してIntroへ戻る
    pub fn logout(&mut self) {
        let user = self.state.session().map(|s| s.username.clone());
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, path = %self.store.path().display(), "failed to remove session file");
        }
        self.apply(AppState::logout);
        if let Some(user) = user {
            tracing::info!(user = %user, "logged out");
        }
    }
}
