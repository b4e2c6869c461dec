//! # 채점 결과(writing_responses) 쿼리
//!
//! (시도, 과제)당 한 행. 같은 과제를 다시 제출하면 이전 결과를 덮어씁니다.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::AppError;
use crate::models::{NewWritingResponse, WritingResponseSummary};

pub async fn upsert_response<'e, E>(
    executor: E,
    response: &NewWritingResponse<'_>,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    let score = response.score;
    let bands = &score.band_scores;

    sqlx::query(
        r#"
        INSERT INTO writing_responses
            (id, user_id, exam_attempt_id, prompt_id, task, answer_text, word_count,
             duration_seconds, evaluation_version, band_scores, feedback, overall_band,
             task_response_band, coherence_band, lexical_band, grammar_band)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(exam_attempt_id, task) DO UPDATE SET
            prompt_id = excluded.prompt_id,
            answer_text = excluded.answer_text,
            word_count = excluded.word_count,
            duration_seconds = excluded.duration_seconds,
            evaluation_version = excluded.evaluation_version,
            band_scores = excluded.band_scores,
            feedback = excluded.feedback,
            overall_band = excluded.overall_band,
            task_response_band = excluded.task_response_band,
            coherence_band = excluded.coherence_band,
            lexical_band = excluded.lexical_band,
            grammar_band = excluded.grammar_band,
            submitted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        "#,
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(response.user_id)
    .bind(response.attempt_id)
    .bind(response.prompt_id)
    .bind(response.task.as_str())
    .bind(response.answer_text)
    .bind(i64::from(score.word_count))
    .bind(score.duration_seconds)
    .bind(&score.version)
    .bind(serde_json::to_string(bands)?)
    .bind(serde_json::to_string(&score.feedback)?)
    .bind(score.overall_band)
    .bind(bands.task_response)
    .bind(bands.coherence_and_cohesion)
    .bind(bands.lexical_resource)
    .bind(bands.grammatical_range)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_responses(
    pool: &SqlitePool,
    attempt_id: &str,
) -> Result<Vec<WritingResponseSummary>, AppError> {
    let rows = sqlx::query_as::<_, WritingResponseSummary>(
        r#"
        SELECT task, prompt_id, word_count, overall_band, evaluation_version, submitted_at
        FROM writing_responses
        WHERE exam_attempt_id = ?
        ORDER BY task
        "#,
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
