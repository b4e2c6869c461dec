//! # 시험 시도(exam_attempts) 쿼리
//!
//! ```text
//! [시작] create_attempt() → in_progress → mark_submitted() → submitted
//! ```
//! 제출은 다시 들어와도 같은 행을 갱신합니다 (재시도 허용).

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::AppError;
use crate::models::ExamAttempt;

pub async fn create_attempt(
    pool: &SqlitePool,
    user_id: &str,
    duration_seconds: Option<i64>,
) -> Result<ExamAttempt, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO exam_attempts (id, user_id, module, status, duration_seconds)
        VALUES (?, ?, 'writing', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(ExamAttempt::IN_PROGRESS)
    .bind(duration_seconds)
    .execute(pool)
    .await?;

    get_attempt(pool, &id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created attempt".to_string()))
}

pub async fn get_attempt(pool: &SqlitePool, id: &str) -> Result<Option<ExamAttempt>, AppError> {
    let attempt = sqlx::query_as::<_, ExamAttempt>(
        r#"
        SELECT id, user_id, module, status, duration_seconds, started_at, submitted_at
        FROM exam_attempts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(attempt)
}

/// 제출 완료로 표시합니다. `duration_seconds`가 없으면 기존 값을 유지합니다.
pub async fn mark_submitted<'e, E>(
    executor: E,
    id: &str,
    duration_seconds: Option<i64>,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE exam_attempts
        SET status = ?,
            submitted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
            duration_seconds = COALESCE(?, duration_seconds)
        WHERE id = ?
        "#,
    )
    .bind(ExamAttempt::SUBMITTED)
    .bind(duration_seconds)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}
