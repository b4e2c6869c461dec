//! # 서버 에러 처리
//!
//! 핸들러와 DB 계층이 공유하는 `AppError`와, 그것을 HTTP 응답으로 바꾸는 `IntoResponse` 구현입니다.
//!
//! 응답 형식은 항상 `{ "error": { "code": "...", "message": "..." } }` 입니다.
//! 시험실 클라이언트(`HttpWritingApi`)는 `error.message`를 그대로 사용자에게 보여줍니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면 Axum이 `IntoResponse`로 응답을 만듭니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("{0}")]
    NotFound(String),

    /// 잘못된 요청 (HTTP 400)
    #[error("{0}")]
    BadRequest(String),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 다른 사용자의 리소스 (HTTP 403)
    #[error("{0}")]
    Forbidden(String),

    /// 더 새로운 상태와 충돌 (HTTP 409)
    #[error("{0}")]
    Conflict(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// #[from]: sqlx 함수에서 `?`를 쓰면 자동으로 이 variant가 됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 저장된 JSON 컬럼(스냅샷, 채점 결과)을 다루다 실패
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }
}

impl IntoResponse for AppError {
    /// 내부 에러(Database, Serialization, Internal)는 로그에만 자세히 남기고
    /// 클라이언트에는 일반적인 메시지만 보냅니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    "Stored data could not be processed".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
