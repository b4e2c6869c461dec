//! # 시험실이 의존하는 서버 API
//!
//! 시험실 로직은 `WritingApi` 트레이트에만 의존합니다. 실제 서버와는 `HttpWritingApi`가
//! 통신하고, 테스트에서는 응답을 마음대로 조작하는 가짜 구현을 끼워 넣습니다.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::autosave::serialize_draft;
use crate::models::{CreateEventRequest, DraftRecord, SubmitRequest, SubmitResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 서버가 2xx가 아닌 응답을 돌려줌
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Rejected { status, .. } => Some(*status),
        }
    }
}

#[async_trait]
pub trait WritingApi: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError>;

    /// 초안을 서버에 올립니다. 성공하면 서버 상태가 `draft`와 같아진 것입니다.
    async fn push_draft(&self, draft: &DraftRecord) -> Result<(), ApiError>;

    async fn record_event(&self, event: &CreateEventRequest) -> Result<(), ApiError>;
}

/// `/api/mock/...` 엔드포인트를 부르는 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct HttpWritingApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpWritingApi {
    /// `base_url`은 `/api` 앞부분까지 (예: `http://127.0.0.1:3000`)
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: rejection_message(status, &body),
        })
    }
}

/// `{"error": {"message": ...}}`, `{"error": "..."}` 순으로 찾고, 없으면 기본 문구
fn rejection_message(status: StatusCode, body: &Value) -> String {
    let error = body.get("error");
    error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| match status {
            StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
            _ => "Submission failed".to_string(),
        })
}

#[async_trait]
impl WritingApi for HttpWritingApi {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/mock/writing/submit"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn push_draft(&self, draft: &DraftRecord) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/mock/writing/drafts/{}", draft.attempt_id)))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serialize_draft(draft))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn record_event(&self, event: &CreateEventRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/mock/writing/events"))
            .bearer_auth(&self.token)
            .json(event)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejection_message_prefers_structured_error() {
        let body = json!({ "error": { "code": "not_found", "message": "Attempt not found" } });
        assert_eq!(rejection_message(StatusCode::NOT_FOUND, &body), "Attempt not found");

        let body = json!({ "error": "Forbidden" });
        assert_eq!(rejection_message(StatusCode::FORBIDDEN, &body), "Forbidden");

        assert_eq!(
            rejection_message(StatusCode::INTERNAL_SERVER_ERROR, &Value::Null),
            "Submission failed"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpWritingApi::new("http://localhost:3000/", "token");
        assert_eq!(api.url("/health"), "http://localhost:3000/api/health");
    }
}
