//! バックエンド呼び出し
//!
//! 5つのエンドポイントを1回ずつ呼ぶだけ。リトライ・タイムアウトは設定しない。
//! 失敗はHTTPステータスの区分だけで分類する。

use crate::config::Config;
use crate::error::{ChemVisError, Result};
use async_trait::async_trait;
use chemvis_common::types::AuthRequest;
use chemvis_common::{AuthResponse, HistoryItemResponse, HistoryResponse, UploadResponse};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;

/// バックエンドとの境界
#[async_trait]
pub trait Backend: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<AuthResponse>;

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;

    async fn upload_csv(&self, token: &str, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse>;

    async fn list_history(&self, token: &str) -> Result<HistoryResponse>;

    async fn get_history_item(&self, token: &str, id: i64) -> Result<HistoryItemResponse>;
}

/// ファイルを読み込んでアップロード
pub async fn upload_file<B: Backend + ?Sized>(
    backend: &B,
    token: &str,
    path: &Path,
) -> Result<UploadResponse> {
    if !path.is_file() {
        return Err(ChemVisError::FileNotFound(path.display().to_string()));
    }
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.csv".to_string());
    backend.upload_csv(token, &file_name, bytes).await
}

/// reqwestによる実装
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    auth_scheme: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.header(AUTHORIZATION, auth_header_value(&self.auth_scheme, token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, protected: bool) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, "backend request failed");
            ChemVisError::Connection(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "backend response");

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ChemVisError::ResponseParse(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, protected))
    }

    async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<AuthResponse> {
        let request = self
            .client
            .post(self.url(path))
            .json(&AuthRequest { username, password });
        self.send(request, false).await
    }
}

#[async_trait]
impl Backend for HttpGateway {
    async fn register(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("register/", username, password).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("login/", username, password).await
    }

    async fn upload_csv(&self, token: &str, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.authorize(self.client.post(self.url("upload/")), token).multipart(form);
        self.send(request, true).await
    }

    async fn list_history(&self, token: &str) -> Result<HistoryResponse> {
        let request = self.authorize(self.client.get(self.url("upload/")), token);
        self.send(request, true).await
    }

    async fn get_history_item(&self, token: &str, id: i64) -> Result<HistoryItemResponse> {
        let request = self.authorize(self.client.get(self.url(&format!("history/{}/", id))), token);
        self.send(request, true).await
    }
}

pub fn auth_header_value(scheme: &str, token: &str) -> String {
    if scheme.is_empty() {
        token.to_string()
    } else {
        format!("{} {}", scheme, token)
    }
}

/// 2xx以外の応答を分類
///
/// 保護されたエンドポイントの401/403は認証切れとして扱う。
pub fn classify_failure(status: StatusCode, body: &str, protected: bool) -> ChemVisError {
    if protected && (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) {
        return ChemVisError::SessionExpired;
    }
    ChemVisError::Backend {
        status: status.as_u16(),
        message: error_message_from_body(status, body),
    }
}

/// `error` フィールドを優先、無ければ本文そのもの
pub fn error_message_from_body(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {}", status.as_u16());
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => match map.get("error") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => serde_json::Value::Object(map).to_string(),
        },
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_on_protected_call_is_session_expired() {
        let err = classify_failure(StatusCode::FORBIDDEN, r#"{"detail":"x"}"#, true);
        assert!(err.is_session_expired());
        assert_eq!(
            err.to_string(),
            "Session expired or invalid. Please log out and log in again."
        );
    }

    #[test]
    fn test_unauthorized_login_is_backend_error() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid Credentials"}"#, false);
        assert!(matches!(err, ChemVisError::Backend { status: 401, .. }));
        assert_eq!(err.to_string(), "Error: Invalid Credentials");
    }

    #[test]
    fn test_validation_payload_is_serialized() {
        let body = r#"{"username":["A user with that username already exists."]}"#;
        let message = error_message_from_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(message, body);
    }

    #[test]
    fn test_raw_body_surfaced() {
        let message = error_message_from_body(StatusCode::INTERNAL_SERVER_ERROR, "Server Error (500)\n");
        assert_eq!(message, "Server Error (500)");
        assert_eq!(error_message_from_body(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn test_auth_header_value() {
        assert_eq!(auth_header_value("Token", "abc"), "Token abc");
        assert_eq!(auth_header_value("", "abc"), "abc");
    }

    #[test]
    fn test_url_join() {
        let config = Config {
            base_url: "http://localhost:8000/api/".to_string(),
            ..Config::default()
        };
        let gateway = HttpGateway::new(&config);
        assert_eq!(gateway.url("login/"), "http://localhost:8000/api/login/");
        assert_eq!(gateway.url("/history/3/"), "http://localhost:8000/api/history/3/");
    }
}
