//! # 시험 시도 API
//!
//! 시도는 시험실을 열기 전에 만들어지고, 그 ID가 로컬 초안 키와 서버 초안/채점 결과를 잇습니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{CreateAttemptRequest, ExamAttempt},
    routes::AppState,
};

/// 시도를 찾고 소유자를 확인합니다. 없으면 404, 다른 사용자의 것이면 403.
pub(crate) async fn owned_attempt(
    pool: &SqlitePool,
    attempt_id: &str,
    user_id: &str,
) -> Result<ExamAttempt, AppError> {
    let attempt = db::get_attempt(pool, attempt_id)
        .await?
        .ok_or_else(|| AppError::not_found("Attempt"))?;
    if attempt.user_id != user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(attempt)
}

/// `POST /api/mock/writing/attempts` + `{ "durationSeconds": 3600 }`
pub async fn create_attempt(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAttemptRequest>,
) -> Result<(StatusCode, Json<ExamAttempt>), AppError> {
    if req.duration_seconds.is_some_and(|d| d <= 0) {
        return Err(AppError::BadRequest(
            "durationSeconds must be positive".to_string(),
        ));
    }

    let attempt = db::create_attempt(&state.pool, &auth.user_id, req.duration_seconds).await?;
    tracing::info!(attempt_id = %attempt.id, user_id = %auth.user_id, "writing attempt created");
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub async fn get_attempt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ExamAttempt>, AppError> {
    let attempt = owned_attempt(&state.pool, &id, &auth.user_id).await?;
    Ok(Json(attempt))
}

/// `GET /api/mock/writing/attempts/{id}/responses` → `{ ok, responses: [...] }`
pub async fn list_attempt_responses(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    owned_attempt(&state.pool, &id, &auth.user_id).await?;
    let responses = db::list_responses(&state.pool, &id).await?;
    Ok(Json(json!({ "ok": true, "responses": responses })))
}
