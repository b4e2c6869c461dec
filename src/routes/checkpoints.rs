//! # 모의고사 체크포인트 API
//!
//! - `POST /api/mock/checkpoints`: 섹션 진행 상황을 하나 더 쌓습니다.
//!   `answers_delta`가 있으면 직전 체크포인트의 답안과 병합해서 저장합니다.
//! - `GET /api/mock/checkpoints`: 기본은 가장 최근 것 하나(`{ok, checkpoint}`),
//!   `latest=false`면 목록(`{ok, checkpoints}`). 완료된 체크포인트는
//!   `includeCompleted=true`일 때만 포함됩니다.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::{
    config::MAX_CHECKPOINT_LIST_LIMIT,
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{Checkpoint, CheckpointFilter, CheckpointQuery, CreateCheckpointRequest, NewCheckpoint},
    routes::AppState,
    services::checkpoint::merge_checkpoint_snapshot,
};

/// DB의 `strftime('%Y-%m-%dT%H:%M:%fZ')`와 같은 모양으로 맞춰서 문자열 정렬이 시간순이 되게 합니다.
fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn non_negative(value: Option<i64>, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) if v < 0 => Err(AppError::BadRequest(format!("{field} must be >= 0"))),
        _ => Ok(()),
    }
}

pub async fn create_checkpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCheckpointRequest>,
) -> Result<Json<Value>, AppError> {
    if req.attempt_id.trim().is_empty() {
        return Err(AppError::BadRequest("attemptId is required".to_string()));
    }
    non_negative(Some(req.section_index), "sectionIndex")?;
    non_negative(req.elapsed_seconds, "elapsedSeconds")?;
    non_negative(req.duration_seconds, "durationSeconds")?;
    if req.mock_id.as_deref().is_some_and(str::is_empty) {
        return Err(AppError::BadRequest("mockId must not be empty".to_string()));
    }

    let created_at = match req.occurred_at.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| to_db_timestamp(dt.with_timezone(&Utc)))
            .map_err(|_| AppError::BadRequest("occurredAt must be an RFC 3339 timestamp".to_string()))?,
        None => to_db_timestamp(Utc::now()),
    };

    let delta = req.answers_delta.as_ref().filter(|d| !d.is_empty());
    let previous = match delta {
        Some(_) => {
            db::latest_snapshot(&state.pool, &auth.user_id, &req.attempt_id, req.section_index)
                .await?
        }
        None => None,
    };
    let snapshot = merge_checkpoint_snapshot(&req.snapshot, previous.as_ref(), delta);

    let row = db::insert_checkpoint(
        &state.pool,
        &NewCheckpoint {
            attempt_id: &req.attempt_id,
            user_id: &auth.user_id,
            section_idx: req.section_index,
            mock_id: req.mock_id.as_deref(),
            snapshot: &snapshot,
            elapsed_sec: req.elapsed_seconds.unwrap_or(0),
            duration_sec: req.duration_seconds,
            completed: req.completed.unwrap_or(false),
            created_at,
        },
    )
    .await?;

    Ok(Json(json!({ "ok": true, "checkpoint": Checkpoint::from(row) })))
}

pub async fn list_checkpoints(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CheckpointQuery>,
) -> Result<Json<Value>, AppError> {
    non_negative(query.section_index, "sectionIndex")?;
    if let Some(limit) = query.limit {
        if !(1..=MAX_CHECKPOINT_LIST_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_CHECKPOINT_LIST_LIMIT}"
            )));
        }
    }

    let filter = CheckpointFilter {
        attempt_id: query.attempt_id.as_deref().filter(|id| !id.is_empty()),
        section_idx: query.section_index,
        mock_id: query.mock_id.as_deref().filter(|id| !id.is_empty()),
        include_completed: query.include_completed.unwrap_or(false),
    };

    if query.latest.unwrap_or(true) {
        let rows = db::list_checkpoints(&state.pool, &auth.user_id, &filter, 1).await?;
        let checkpoint = rows.into_iter().next().map(Checkpoint::from);
        return Ok(Json(json!({ "ok": true, "checkpoint": checkpoint })));
    }

    let limit = query.limit.unwrap_or(state.checkpoint_list_limit);
    let checkpoints: Vec<Checkpoint> = db::list_checkpoints(&state.pool, &auth.user_id, &filter, limit)
        .await?
        .into_iter()
        .map(Checkpoint::from)
        .collect();

    Ok(Json(json!({ "ok": true, "checkpoints": checkpoints })))
}
