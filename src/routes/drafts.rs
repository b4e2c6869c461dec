//! # 서버 측 초안 동기화 API
//!
//! 시험실은 동기화 정책이 허락할 때만 초안을 올립니다(`PUT`). 본문은 로컬 저장소와 같은
//! 직렬화 형식(`{v, attemptId, startedAt, updatedAt, syncedAt?, content}`)입니다.
//!
//! - 이미 저장된 초안보다 오래된 초안 → 409
//! - 제출이 끝난 시도 → 409

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    autosave::deserialize_draft,
    db,
    error::AppError,
    middleware::auth::AuthUser,
    routes::{attempts::owned_attempt, AppState},
};

/// `PUT /api/mock/writing/drafts/{attempt_id}` → `{ ok, syncedAt, updatedAt }`
pub async fn put_draft(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attempt_id): Path<String>,
    body: String,
) -> Result<Json<Value>, AppError> {
    let draft = deserialize_draft(&body)
        .ok_or_else(|| AppError::BadRequest("Invalid draft payload".to_string()))?;
    if draft.attempt_id != attempt_id {
        return Err(AppError::BadRequest(
            "Draft attemptId does not match the URL".to_string(),
        ));
    }

    let attempt = owned_attempt(&state.pool, &attempt_id, &auth.user_id).await?;
    if attempt.is_submitted() {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    let stored = db::upsert_draft(&state.pool, &auth.user_id, &draft).await?;
    tracing::debug!(
        attempt_id = %attempt_id,
        updated_at = draft.updated_at,
        words = draft.content.task1_word_count + draft.content.task2_word_count,
        "draft stored"
    );

    Ok(Json(json!({
        "ok": true,
        "syncedAt": stored.synced_at,
        "updatedAt": stored.draft_updated_at,
    })))
}

/// `GET /api/mock/writing/drafts/{attempt_id}` → `{ ok, draft, syncedAt }`
pub async fn fetch_draft(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attempt_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    owned_attempt(&state.pool, &attempt_id, &auth.user_id).await?;

    let stored = db::get_draft(&state.pool, &attempt_id)
        .await?
        .ok_or_else(|| AppError::not_found("Draft"))?;
    let draft = deserialize_draft(&stored.payload)
        .ok_or_else(|| AppError::Internal(format!("stored draft for {attempt_id} is unreadable")))?;

    Ok(Json(json!({
        "ok": true,
        "draft": draft,
        "syncedAt": stored.synced_at,
    })))
}
