//! # 작문 제출 / 시험 이벤트 API
//!
//! ## 제출 흐름
//! ```text
//! 1. 본문이 있는 과제가 하나도 없으면 400
//! 2. 시도 확인 (없으면 404, 남의 것이면 403)
//! 3. 과제별로 기본 채점기 실행 → writing_responses upsert
//! 4. 시도를 submitted로 표시, submit 이벤트 기록
//! ```
//! 3~4는 한 트랜잭션입니다. 중간에 실패하면 아무것도 기록되지 않습니다.
//! 같은 시도를 다시 제출하면 과제별 결과를 덮어씁니다. 자동 제출이 실패한 뒤의
//! 수동 재시도가 그대로 통과해야 하기 때문입니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{
        CreateEventRequest, NewWritingResponse, SubmitRequest, TaskResults, WritingTask,
        EVENT_TYPES,
    },
    routes::{attempts::owned_attempt, AppState},
    services::scoring::{score_essay, ScoreContext},
};

/// `POST /api/mock/writing/submit` → `{ ok, attemptId, results: { task1?, task2? } }`
pub async fn submit_writing(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<Value>, AppError> {
    if req.attempt_id.trim().is_empty() {
        return Err(AppError::BadRequest("attemptId is required".to_string()));
    }
    if !req.tasks.has_any() {
        return Err(AppError::BadRequest(
            "At least one task response is required".to_string(),
        ));
    }

    let attempt = owned_attempt(&state.pool, &req.attempt_id, &auth.user_id).await?;
    let duration_seconds = req.duration_seconds.or(attempt.duration_seconds);

    let mut tx = state.pool.begin().await?;
    let mut results = TaskResults::default();
    for task in WritingTask::ALL {
        let Some(submission) = req.tasks.get(task) else {
            continue;
        };
        if submission.essay.trim().is_empty() {
            continue;
        }

        let score = score_essay(&ScoreContext {
            essay: &submission.essay,
            task,
            word_target: None,
            duration_seconds,
        });
        db::upsert_response(
            &mut *tx,
            &NewWritingResponse {
                user_id: &auth.user_id,
                attempt_id: &req.attempt_id,
                prompt_id: submission.prompt_id.as_deref(),
                task,
                answer_text: &submission.essay,
                score: &score,
            },
        )
        .await?;
        results.set(task, score);
    }

    db::mark_submitted(&mut *tx, &req.attempt_id, req.duration_seconds).await?;
    db::insert_event(
        &mut *tx,
        &req.attempt_id,
        &auth.user_id,
        "submit",
        &json!({ "durationSeconds": req.duration_seconds }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        attempt_id = %req.attempt_id,
        resubmission = attempt.is_submitted(),
        "writing attempt submitted"
    );

    Ok(Json(json!({
        "ok": true,
        "attemptId": req.attempt_id,
        "results": results,
    })))
}

/// `POST /api/mock/writing/events` + `{ attemptId, eventType, payload }`
pub async fn record_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<Value>, AppError> {
    if !EVENT_TYPES.contains(&req.event_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown event type: {}",
            req.event_type
        )));
    }
    owned_attempt(&state.pool, &req.attempt_id, &auth.user_id).await?;

    let payload = req.payload.unwrap_or_else(|| json!({}));
    let event = db::insert_event(
        &state.pool,
        &req.attempt_id,
        &auth.user_id,
        &req.event_type,
        &payload,
    )
    .await?;

    Ok(Json(json!({
        "ok": true,
        "id": event.id,
        "eventType": event.event_type,
        "createdAt": event.created_at,
    })))
}
