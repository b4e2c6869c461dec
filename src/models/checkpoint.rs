//! # 모의고사 체크포인트 모델
//!
//! 섹션 단위 진행 상황 스냅샷입니다. 재개(resume) 화면이 가장 최근 체크포인트를 읽어
//! 응시자를 중단된 위치로 돌려보냅니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `mock_checkpoints` 테이블 한 행
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckpointRow {
    pub id: i64,
    pub attempt_id: String,
    pub user_id: String,
    pub section_idx: i64,
    pub mock_id: Option<String>,
    pub snapshot: String,
    pub elapsed_sec: i64,
    pub duration_sec: Option<i64>,
    pub completed: bool,
    pub created_at: String,
}

/// API 응답용 체크포인트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub attempt_id: String,
    pub section_index: i64,
    pub mock_id: Option<String>,
    pub snapshot: Value,
    pub elapsed_seconds: i64,
    pub duration_seconds: Option<i64>,
    pub completed: bool,
    pub created_at: String,
}

impl From<CheckpointRow> for Checkpoint {
    fn from(row: CheckpointRow) -> Self {
        // 손상된 스냅샷은 빈 객체로 내보냅니다.
        let snapshot = serde_json::from_str(&row.snapshot)
            .unwrap_or_else(|_| Value::Object(Map::new()));
        Self {
            attempt_id: row.attempt_id,
            section_index: row.section_idx,
            mock_id: row.mock_id,
            snapshot,
            elapsed_seconds: row.elapsed_sec,
            duration_seconds: row.duration_sec,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

/// `POST /api/mock/checkpoints` 요청 본문
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckpointRequest {
    pub attempt_id: String,
    pub section_index: i64,
    #[serde(default)]
    pub snapshot: Value,
    pub mock_id: Option<String>,
    pub elapsed_seconds: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub completed: Option<bool>,
    pub occurred_at: Option<String>,
    #[serde(default, rename = "answers_delta")]
    pub answers_delta: Option<Map<String, Value>>,
}

/// `GET /api/mock/checkpoints` 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointQuery {
    pub attempt_id: Option<String>,
    pub section_index: Option<i64>,
    pub mock_id: Option<String>,
    pub include_completed: Option<bool>,
    pub latest: Option<bool>,
    pub limit: Option<i64>,
}

/// DB 삽입용 체크포인트
#[derive(Debug, Clone)]
pub struct NewCheckpoint<'a> {
    pub attempt_id: &'a str,
    pub user_id: &'a str,
    pub section_idx: i64,
    pub mock_id: Option<&'a str>,
    pub snapshot: &'a Value,
    pub elapsed_sec: i64,
    pub duration_sec: Option<i64>,
    pub completed: bool,
    pub created_at: String,
}

/// 목록 조회 필터 (user_id는 항상 적용)
#[derive(Debug, Clone, Default)]
pub struct CheckpointFilter<'a> {
    pub attempt_id: Option<&'a str>,
    pub section_idx: Option<i64>,
    pub mock_id: Option<&'a str>,
    pub include_completed: bool,
}
