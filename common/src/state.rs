//! 画面状態マシン
//!
//! Intro → AuthForm(Login|Register) → Dashboard の3状態。
//! 状態は `AppState` が一括して所有し、すべての変更は値を受け取って
//! 新しい状態を返す遷移関数で行う。
//!
//! バックエンド呼び出しは `RequestTicket` を発行してから行い、
//! 応答はチケットが現在の世代と一致する場合のみ反映する。
//! ログアウトで世代が進むため、ログアウト前に出した要求の応答は破棄される。

use crate::error::{Error, Result};
use crate::types::{HistoryEntry, HistoryItemResponse, StatsSummary, UploadResponse, EquipmentRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const MSG_MISSING_CREDENTIALS: &str = "Please enter both username and password.";
pub const MSG_NO_FILE: &str = "Please select a CSV file first.";
pub const MSG_UPLOAD_IN_FLIGHT: &str = "An upload is already in progress.";

/// 認証フォームのモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login",
            AuthMode::Register => "Register",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            AuthMode::Login => "Login",
            AuthMode::Register => "Create Account",
        }
    }

    /// モード切替リンクの文言
    pub fn switch_label(&self) -> &'static str {
        match self {
            AuthMode::Login => "Don't have an account? Register here",
            AuthMode::Register => "Already have an account? Login here",
        }
    }
}

/// 表示中の画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Intro,
    AuthForm(AuthMode),
    Dashboard,
}

/// ログイン中のユーザーと認証トークン
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// トークンはログに出さない
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// ユーザー名・パスワードの事前チェック
pub fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(Error::Validation(MSG_MISSING_CREDENTIALS.to_string()));
    }
    Ok(())
}

/// アップロードの事前チェック
pub fn validate_upload(selected_file: Option<&Path>, uploading: bool) -> Result<()> {
    if selected_file.is_none() {
        return Err(Error::Validation(MSG_NO_FILE.to_string()));
    }
    if uploading {
        return Err(Error::Validation(MSG_UPLOAD_IN_FLIGHT.to_string()));
    }
    Ok(())
}

/// ダッシュボードに表示するデータ（ログアウトで全消去）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub rows: Vec<EquipmentRow>,
    pub stats: Option<StatsSummary>,
    pub history: Vec<HistoryEntry>,
    pub selected_file: Option<PathBuf>,
    pub error: Option<String>,
    /// アップロード中はアップロード操作を無効化する
    pub uploading: bool,
}

/// 要求の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Auth(AuthMode),
    Upload,
    ListHistory,
    HistoryItem(i64),
}

/// 発行済み要求の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    sequence: u64,
    kind: RequestKind,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 応答の反映結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// 世代不一致のため破棄
    Stale,
}

/// アプリケーション全体の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    view: ViewState,
    session: Option<Session>,
    auth_error: Option<String>,
    dashboard: DashboardData,
    generation: u64,
    item_sequence: u64,
}

impl AppState {
    /// 起動時の状態（常にIntroから）
    pub fn startup(session: Option<Session>) -> Self {
        Self {
            session: session.filter(Session::is_valid),
            ..Self::default()
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    pub fn dashboard(&self) -> &DashboardData {
        &self.dashboard
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// チケットが現在の状態に対して有効か
    ///
    /// 履歴アイテムは最後に発行した要求のみ有効（後から届いた古い応答で上書きしない）。
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match ticket.kind {
            RequestKind::HistoryItem(_) => ticket.sequence == self.item_sequence,
            _ => true,
        }
    }

    fn ticket(&self, kind: RequestKind) -> RequestTicket {
        RequestTicket {
            generation: self.generation,
            sequence: self.item_sequence,
            kind,
        }
    }

    /// Intro → AuthForm(Login) / Dashboard
    #[must_use]
    pub fn proceed(mut self) -> Self {
        if self.view == ViewState::Intro {
            self.view = if self.session.is_some() {
                ViewState::Dashboard
            } else {
                ViewState::AuthForm(AuthMode::Login)
            };
        }
        self
    }

    #[must_use]
    pub fn toggle_mode(mut self) -> Self {
        if let ViewState::AuthForm(mode) = self.view {
            self.view = ViewState::AuthForm(mode.toggled());
            self.auth_error = None;
        }
        self
    }

    /// 認証要求を発行。入力不足ならエラーを表示してチケットなし
    #[must_use]
    pub fn submit_auth(mut self, username: &str, password: &str) -> (Self, Option<RequestTicket>) {
        let ViewState::AuthForm(mode) = self.view else {
            return (self, None);
        };
        if let Err(err) = validate_credentials(username, password) {
            self.auth_error = Some(err.to_string());
            return (self, None);
        }
        self.auth_error = None;
        let ticket = self.ticket(RequestKind::Auth(mode));
        (self, Some(ticket))
    }

    #[must_use]
    pub fn auth_succeeded(mut self, ticket: RequestTicket, session: Session) -> (Self, Delivery) {
        if !self.is_current(&ticket) || !matches!(self.view, ViewState::AuthForm(_)) {
            return (self, Delivery::Stale);
        }
        self.session = Some(session);
        self.auth_error = None;
        self.dashboard = DashboardData::default();
        self.view = ViewState::Dashboard;
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn auth_failed(mut self, ticket: RequestTicket, message: impl Into<String>) -> (Self, Delivery) {
        if !self.is_current(&ticket) || !matches!(self.view, ViewState::AuthForm(_)) {
            return (self, Delivery::Stale);
        }
        self.auth_error = Some(message.into());
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn select_file(mut self, path: impl Into<PathBuf>) -> Self {
        if self.view == ViewState::Dashboard {
            self.dashboard.selected_file = Some(path.into());
            self.dashboard.error = None;
        }
        self
    }

    /// アップロード要求を発行。ファイル未選択・アップロード中はチケットなし
    #[must_use]
    pub fn begin_upload(mut self) -> (Self, Option<RequestTicket>) {
        if self.view != ViewState::Dashboard || self.session.is_none() {
            return (self, None);
        }
        if let Err(err) = validate_upload(
            self.dashboard.selected_file.as_deref(),
            self.dashboard.uploading,
        ) {
            self.dashboard.error = Some(err.to_string());
            return (self, None);
        }
        self.dashboard.uploading = true;
        self.dashboard.error = None;
        let ticket = self.ticket(RequestKind::Upload);
        (self, Some(ticket))
    }

    #[must_use]
    pub fn upload_succeeded(mut self, ticket: RequestTicket, response: UploadResponse) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.rows = response.data;
        self.dashboard.stats = response.stats;
        self.dashboard.history = response.history;
        self.dashboard.error = None;
        self.dashboard.uploading = false;
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn upload_failed(mut self, ticket: RequestTicket, message: impl Into<String>) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.error = Some(message.into());
        self.dashboard.uploading = false;
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn begin_list_history(self) -> (Self, Option<RequestTicket>) {
        if self.view != ViewState::Dashboard || self.session.is_none() {
            return (self, None);
        }
        let ticket = self.ticket(RequestKind::ListHistory);
        (self, Some(ticket))
    }

    #[must_use]
    pub fn history_loaded(mut self, ticket: RequestTicket, history: Vec<HistoryEntry>) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.history = history;
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn history_failed(mut self, ticket: RequestTicket, message: impl Into<String>) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.error = Some(message.into());
        (self, Delivery::Applied)
    }

    /// 履歴アイテム要求を発行。以前に発行した履歴アイテム要求は無効になる
    #[must_use]
    pub fn begin_history_item(mut self, id: i64) -> (Self, Option<RequestTicket>) {
        if self.view != ViewState::Dashboard || self.session.is_none() {
            return (self, None);
        }
        self.item_sequence += 1;
        self.dashboard.error = None;
        let ticket = self.ticket(RequestKind::HistoryItem(id));
        (self, Some(ticket))
    }

    #[must_use]
    pub fn history_item_loaded(mut self, ticket: RequestTicket, response: HistoryItemResponse) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.rows = response.data;
        self.dashboard.stats = response.stats;
        self.dashboard.error = None;
        (self, Delivery::Applied)
    }

    #[must_use]
    pub fn history_item_failed(mut self, ticket: RequestTicket, message: impl Into<String>) -> (Self, Delivery) {
        if !self.is_current(&ticket) {
            return (self, Delivery::Stale);
        }
        self.dashboard.error = Some(message.into());
        (self, Delivery::Applied)
    }

    /// セッションと派生データをすべて消去してIntroへ戻る
    #[must_use]
    pub fn logout(mut self) -> Self {
        if self.view != ViewState::Dashboard {
            return self;
        }
        self.session = None;
        self.auth_error = None;
        self.dashboard = DashboardData::default();
        self.view = ViewState::Intro;
        self.generation += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDistribution;

    fn logged_in() -> AppState {
        AppState::startup(Some(Session::new("tok123", "alice"))).proceed()
    }

    fn pump_upload() -> UploadResponse {
        UploadResponse {
            data: vec![EquipmentRow::new().with("Equipment Name", "Pump-1")],
            stats: Some(StatsSummary {
                total_count: 1,
                avg_pressure: 120.0,
                avg_temp: 80.0,
                type_distribution: TypeDistribution::from_pairs([("Pump", 1)]),
            }),
            history: vec![HistoryEntry {
                file_name: "pumps.csv".to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_startup_is_intro() {
        let state = AppState::startup(Some(Session::new("tok", "bob")));
        assert_eq!(state.view(), ViewState::Intro);
        assert!(state.session().is_some());
    }

    #[test]
    fn test_startup_drops_empty_token() {
        let state = AppState::startup(Some(Session::new("", "bob")));
        assert!(state.session().is_none());
    }

    #[test]
    fn test_proceed_without_session() {
        let state = AppState::startup(None).proceed();
        assert_eq!(state.view(), ViewState::AuthForm(AuthMode::Login));
    }

    #[test]
    fn test_proceed_with_session() {
        assert_eq!(logged_in().view(), ViewState::Dashboard);
    }

    #[test]
    fn test_toggle_mode_clears_error() {
        let state = AppState::startup(None).proceed();
        let (state, ticket) = state.submit_auth("", "");
        assert!(ticket.is_none());
        assert_eq!(state.auth_error(), Some(MSG_MISSING_CREDENTIALS));

        let state = state.toggle_mode();
        assert_eq!(state.view(), ViewState::AuthForm(AuthMode::Register));
        assert_eq!(state.auth_error(), None);

        let state = state.toggle_mode();
        assert_eq!(state.view(), ViewState::AuthForm(AuthMode::Login));
    }

    #[test]
    fn test_auth_success_commits_session() {
        let state = AppState::startup(None).proceed();
        let (state, ticket) = state.submit_auth("alice", "pw1");
        let ticket = ticket.expect("チケットが発行されない");
        assert_eq!(ticket.kind(), RequestKind::Auth(AuthMode::Login));

        let (state, delivery) = state.auth_succeeded(ticket, Session::new("tok123", "alice"));
        assert_eq!(delivery, Delivery::Applied);
        assert_eq!(state.view(), ViewState::Dashboard);
        assert_eq!(state.session().map(|s| s.username.as_str()), Some("alice"));
        assert_eq!(state.token(), Some("tok123"));
    }

    #[test]
    fn test_auth_failure_stays_on_form() {
        let state = AppState::startup(None).proceed().toggle_mode();
        let (state, ticket) = state.submit_auth("alice", "pw1");
        let (state, _) = state.auth_failed(ticket.unwrap(), "Error: username already exists");
        assert_eq!(state.view(), ViewState::AuthForm(AuthMode::Register));
        assert_eq!(state.auth_error(), Some("Error: username already exists"));
        assert!(state.session().is_none());
    }

    #[test]
    fn test_upload_requires_file() {
        let (state, ticket) = logged_in().begin_upload();
        assert!(ticket.is_none());
        assert_eq!(state.dashboard().error.as_deref(), Some(MSG_NO_FILE));
        assert!(!state.dashboard().uploading);
    }

    #[test]
    fn test_upload_in_flight_blocks_second_upload() {
        let state = logged_in().select_file("pumps.csv");
        let (state, first) = state.begin_upload();
        assert!(first.is_some());
        assert!(state.dashboard().uploading);

        let (state, second) = state.begin_upload();
        assert!(second.is_none());
        assert_eq!(state.dashboard().error.as_deref(), Some(MSG_UPLOAD_IN_FLIGHT));

        let (state, delivery) = state.upload_succeeded(first.unwrap(), pump_upload());
        assert_eq!(delivery, Delivery::Applied);
        assert!(!state.dashboard().uploading);
        assert_eq!(state.dashboard().rows.len(), 1);
        assert_eq!(state.dashboard().history.len(), 1);
        assert_eq!(state.dashboard().stats.as_ref().map(|s| s.total_count), Some(1));
    }

    #[test]
    fn test_upload_failure_reenables_upload() {
        let state = logged_in().select_file("pumps.csv");
        let (state, ticket) = state.begin_upload();
        let (state, _) = state.upload_failed(ticket.unwrap(), "Connection to backend failed.");
        assert!(!state.dashboard().uploading);
        assert_eq!(state.dashboard().error.as_deref(), Some("Connection to backend failed."));
    }

    #[test]
    fn test_logout_clears_everything() {
        let state = logged_in().select_file("pumps.csv");
        let (state, ticket) = state.begin_upload();
        let (state, _) = state.upload_succeeded(ticket.unwrap(), pump_upload());

        let state = state.logout();
        assert_eq!(state.view(), ViewState::Intro);
        assert!(state.session().is_none());
        assert_eq!(state.dashboard(), &DashboardData::default());
    }

    #[test]
    fn test_response_after_logout_is_discarded() {
        let state = logged_in().select_file("pumps.csv");
        let (state, ticket) = state.begin_upload();
        let state = state.logout();

        let (state, delivery) = state.upload_succeeded(ticket.unwrap(), pump_upload());
        assert_eq!(delivery, Delivery::Stale);
        assert!(state.dashboard().rows.is_empty());
        assert!(state.dashboard().stats.is_none());
    }

    #[test]
    fn test_only_latest_history_item_lands() {
        let (state, first) = logged_in().begin_history_item(1);
        let (state, second) = state.begin_history_item(2);

        let older = HistoryItemResponse {
            data: vec![EquipmentRow::new().with("Equipment Name", "Old")],
            stats: None,
        };
        let newer = HistoryItemResponse {
            data: vec![EquipmentRow::new().with("Equipment Name", "New")],
            stats: None,
        };

        let (state, delivery) = state.history_item_loaded(second.unwrap(), newer.clone());
        assert_eq!(delivery, Delivery::Applied);
        let (state, delivery) = state.history_item_loaded(first.unwrap(), older);
        assert_eq!(delivery, Delivery::Stale);
        assert_eq!(state.dashboard().rows, newer.data);
    }

    #[test]
    fn test_list_history_requires_dashboard() {
        let (_, ticket) = AppState::startup(None).proceed().begin_list_history();
        assert!(ticket.is_none());

        let (state, ticket) = logged_in().begin_list_history();
        let history = vec![HistoryEntry {
            id: Some(3),
            file_name: "a.csv".to_string(),
            ..Default::default()
        }];
        let (state, _) = state.history_loaded(ticket.unwrap(), history.clone());
        assert_eq!(state.dashboard().history, history);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let debug = format!("{:?}", Session::new("secret-token", "alice"));
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_session_json_roundtrip_fields() {
        let json = Session::new("tok", "carol").to_json().unwrap();
        assert!(json.contains("\"token\""));
        let session = Session::from_json(&json).unwrap();
        assert_eq!(session.username, "carol");
    }
}
