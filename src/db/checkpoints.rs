//! # 모의고사 체크포인트(mock_checkpoints) 쿼리
//!
//! 체크포인트는 덮어쓰지 않고 계속 쌓입니다. "최신"은 `created_at`, 같으면 `id`가 큰 쪽입니다.

use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::{CheckpointFilter, CheckpointRow, NewCheckpoint};

const COLUMNS: &str = "id, attempt_id, user_id, section_idx, mock_id, snapshot, \
                       elapsed_sec, duration_sec, completed, created_at";

/// 같은 사용자/시도/섹션의 가장 최근 스냅샷. 손상된 JSON은 없는 것으로 봅니다.
pub async fn latest_snapshot(
    pool: &SqlitePool,
    user_id: &str,
    attempt_id: &str,
    section_idx: i64,
) -> Result<Option<Value>, AppError> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT snapshot
        FROM mock_checkpoints
        WHERE user_id = ? AND attempt_id = ? AND section_idx = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(attempt_id)
    .bind(section_idx)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|(snapshot,)| serde_json::from_str(&snapshot).ok()))
}

pub async fn insert_checkpoint(
    pool: &SqlitePool,
    checkpoint: &NewCheckpoint<'_>,
) -> Result<CheckpointRow, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO mock_checkpoints
            (attempt_id, user_id, section_idx, mock_id, snapshot,
             elapsed_sec, duration_sec, completed, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(checkpoint.attempt_id)
    .bind(checkpoint.user_id)
    .bind(checkpoint.section_idx)
    .bind(checkpoint.mock_id)
    .bind(serde_json::to_string(checkpoint.snapshot)?)
    .bind(checkpoint.elapsed_sec)
    .bind(checkpoint.duration_sec)
    .bind(checkpoint.completed)
    .bind(&checkpoint.created_at)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, CheckpointRow>(&format!(
        "SELECT {COLUMNS} FROM mock_checkpoints WHERE id = ?"
    ))
    .bind(result.last_insert_rowid())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// 사용자의 체크포인트를 최신순으로 `limit`개까지 조회합니다.
pub async fn list_checkpoints(
    pool: &SqlitePool,
    user_id: &str,
    filter: &CheckpointFilter<'_>,
    limit: i64,
) -> Result<Vec<CheckpointRow>, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM mock_checkpoints WHERE user_id = "
    ));
    builder.push_bind(user_id);

    if let Some(attempt_id) = filter.attempt_id {
        builder.push(" AND attempt_id = ").push_bind(attempt_id);
    }
    if let Some(section_idx) = filter.section_idx {
        builder.push(" AND section_idx = ").push_bind(section_idx);
    }
    if let Some(mock_id) = filter.mock_id {
        builder.push(" AND mock_id = ").push_bind(mock_id);
    }
    if !filter.include_completed {
        builder.push(" AND completed = 0");
    }
    builder
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit);

    let rows = builder
        .build_query_as::<CheckpointRow>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
