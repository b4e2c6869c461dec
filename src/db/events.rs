use serde_json::Value;
use sqlx::SqliteExecutor;

use crate::error::AppError;
use crate::models::ExamEvent;

/// 시험 이벤트 한 건을 기록하고, 저장된 행을 돌려줍니다.
pub async fn insert_event<'e, E>(
    executor: E,
    attempt_id: &str,
    user_id: &str,
    event_type: &str,
    payload: &Value,
) -> Result<ExamEvent, AppError>
where
    E: SqliteExecutor<'e>,
{
    let event = sqlx::query_as::<_, ExamEvent>(
        r#"
        INSERT INTO exam_events (id, attempt_id, user_id, event_type, payload)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, attempt_id, user_id, event_type, payload, created_at
        "#,
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(attempt_id)
    .bind(user_id)
    .bind(event_type)
    .bind(payload.to_string())
    .fetch_one(executor)
    .await?;

    Ok(event)
}
