//! # 서버 측 초안 사본(writing_drafts) 쿼리
//!
//! 시도당 한 행. 클라이언트가 보낸 직렬화된 초안을 그대로 `payload`에 보관하고,
//! 비교용으로 `draft_updated_at`(epoch ms)과 단어 수를 따로 둡니다.

use sqlx::SqlitePool;

use crate::autosave::serialize_draft;
use crate::error::AppError;
use crate::models::{DraftRecord, StoredDraft};

/// 초안을 저장합니다.
///
/// 이미 저장된 초안보다 오래된 초안(`updatedAt`이 더 작음)은 덮어쓰지 않고 `Conflict`.
/// 같은 시각의 재전송은 받아들입니다.
pub async fn upsert_draft(
    pool: &SqlitePool,
    user_id: &str,
    draft: &DraftRecord,
) -> Result<StoredDraft, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO writing_drafts
            (attempt_id, user_id, payload, draft_updated_at, task1_word_count, task2_word_count)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(attempt_id) DO UPDATE SET
            payload = excluded.payload,
            draft_updated_at = excluded.draft_updated_at,
            task1_word_count = excluded.task1_word_count,
            task2_word_count = excluded.task2_word_count,
            synced_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE excluded.draft_updated_at >= writing_drafts.draft_updated_at
        "#,
    )
    .bind(&draft.attempt_id)
    .bind(user_id)
    .bind(serialize_draft(draft))
    .bind(draft.updated_at)
    .bind(i64::from(draft.content.task1_word_count))
    .bind(i64::from(draft.content.task2_word_count))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "A newer draft is already stored for this attempt".to_string(),
        ));
    }

    get_draft(pool, &draft.attempt_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve stored draft".to_string()))
}

pub async fn get_draft(pool: &SqlitePool, attempt_id: &str) -> Result<Option<StoredDraft>, AppError> {
    let draft = sqlx::query_as::<_, StoredDraft>(
        r#"
        SELECT attempt_id, user_id, payload, draft_updated_at,
               task1_word_count, task2_word_count, synced_at
        FROM writing_drafts
        WHERE attempt_id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(pool)
    .await?;

    Ok(draft)
}
