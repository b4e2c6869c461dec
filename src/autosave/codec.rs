//! # 초안 코덱
//!
//! `DraftRecord` <-> 저장용 JSON 문자열.
//!
//! ```text
//! { "v": 1, "attemptId": "...", "startedAt": 0, "updatedAt": 0, "syncedAt": 0?, "content": {...} }
//! ```
//!
//! 읽기는 절대 패닉하지 않습니다. 깨진 JSON, 빈 attemptId, 현재 코드보다 새로운 스키마
//! 버전은 모두 `None`(캐시 미스)입니다. 예전 페이로드의 `version` 필드도 받아들입니다.

use serde_json::{json, Map, Value};

use super::session::{AutosaveSnapshot, SnapshotCodec};
use crate::models::{DraftContent, DraftRecord};
use crate::services::text::count_words;

/// 현재 초안 스키마 버전
pub const STORAGE_VERSION: u32 = 1;

pub fn serialize_draft(record: &DraftRecord) -> String {
    let mut value = json!({
        "v": STORAGE_VERSION,
        "attemptId": record.attempt_id,
        "startedAt": record.started_at,
        "updatedAt": record.updated_at,
        "content": {
            "task1": record.content.task1,
            "task2": record.content.task2,
            "task1WordCount": record.content.task1_word_count,
            "task2WordCount": record.content.task2_word_count,
        },
    });
    if let (Some(synced_at), Some(obj)) = (record.synced_at, value.as_object_mut()) {
        obj.insert("syncedAt".to_string(), json!(synced_at));
    }
    value.to_string()
}

/// epoch 밀리초. 음수는 0으로 올립니다.
fn timestamp(obj: &Map<String, Value>, field: &str) -> Option<i64> {
    let value = obj.get(field)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .map(|ms| ms.max(0))
}

fn sanitize_content(value: Option<&Value>) -> DraftContent {
    let obj = value.and_then(Value::as_object);
    let text = |field: &str| {
        obj.and_then(|o| o.get(field))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let task1 = text("task1");
    let task2 = text("task2");
    let stored_count = |field: &str| {
        obj.and_then(|o| o.get(field))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };

    DraftContent {
        task1_word_count: stored_count("task1WordCount").unwrap_or_else(|| count_words(&task1)),
        task2_word_count: stored_count("task2WordCount").unwrap_or_else(|| count_words(&task2)),
        task1,
        task2,
    }
}

pub fn deserialize_draft(raw: &str) -> Option<DraftRecord> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let obj = parsed.as_object()?;

    let version = match obj.get("v").or_else(|| obj.get("version")) {
        None | Some(Value::Null) => u64::from(STORAGE_VERSION),
        Some(v) => v.as_u64()?,
    };
    if version > u64::from(STORAGE_VERSION) {
        return None;
    }

    let attempt_id = obj.get("attemptId").and_then(Value::as_str)?;
    if attempt_id.is_empty() {
        return None;
    }

    let started = timestamp(obj, "startedAt");
    let updated = timestamp(obj, "updatedAt");
    let started_at = started.or(updated).unwrap_or(0);
    let updated_at = updated.unwrap_or(started_at).max(started_at);

    Some(DraftRecord {
        attempt_id: attempt_id.to_string(),
        started_at,
        updated_at,
        synced_at: timestamp(obj, "syncedAt"),
        content: sanitize_content(obj.get("content")),
    })
}

/// 새 빈 초안
pub fn create_draft(attempt_id: impl Into<String>, now: i64) -> DraftRecord {
    DraftRecord {
        attempt_id: attempt_id.into(),
        started_at: now,
        updated_at: now,
        synced_at: None,
        content: DraftContent::default(),
    }
}

/// 내용을 바꾼 새 레코드. `updated_at`은 뒤로 가지 않습니다.
pub fn update_draft_content(draft: &DraftRecord, content: DraftContent, now: i64) -> DraftRecord {
    DraftRecord {
        updated_at: now.max(draft.updated_at).max(draft.started_at),
        content,
        ..draft.clone()
    }
}

/// 서버 푸시 성공을 기록한 새 레코드.
///
/// `synced_at`은 `updated_at`보다 작아지지 않으므로, 이후 편집이 없는 한
/// 동기화 정책은 다시 푸시를 요구하지 않습니다.
pub fn mark_draft_synced(draft: &DraftRecord, at: i64) -> DraftRecord {
    DraftRecord {
        synced_at: Some(at.max(draft.updated_at)),
        ..draft.clone()
    }
}

/// 자동저장 세션이 초안을 위 형식 그대로 저장하도록 하는 코덱
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftCodec;

impl SnapshotCodec<DraftRecord> for DraftCodec {
    fn encode(&self, snapshot: &AutosaveSnapshot<DraftRecord>) -> Result<String, serde_json::Error> {
        Ok(serialize_draft(&snapshot.data))
    }

    fn stamp(&self, data: &DraftRecord, _now: i64) -> i64 {
        data.updated_at
    }

    fn decode(&self, raw: &str, _version: u32, _now: i64) -> Option<AutosaveSnapshot<DraftRecord>> {
        deserialize_draft(raw).map(|record| AutosaveSnapshot {
            updated_at: record.updated_at,
            version: STORAGE_VERSION,
            data: record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DraftRecord {
        DraftRecord {
            attempt_id: "attempt-123".to_string(),
            started_at: 1_000,
            updated_at: 6_000,
            synced_at: None,
            content: DraftContent::new("The chart shows rising sales.", "Some people believe..."),
        }
    }

    #[test]
    fn round_trip_preserves_record() {
        let record = sample();
        assert_eq!(deserialize_draft(&serialize_draft(&record)), Some(record.clone()));

        let synced = mark_draft_synced(&record, 7_000);
        assert_eq!(deserialize_draft(&serialize_draft(&synced)), Some(synced));
    }

    #[test]
    fn absent_synced_at_stays_absent() {
        let raw = serialize_draft(&sample());
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert!(value.get("syncedAt").is_none());
        assert_eq!(value["v"], json!(STORAGE_VERSION));
        assert_eq!(deserialize_draft(&raw).unwrap().synced_at, None);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let raw = serialize_draft(&sample()).replace("\"v\":1", "\"v\":2");
        assert_eq!(deserialize_draft(&raw), None);

        let legacy_newer = r#"{"version":99,"attemptId":"a","startedAt":1,"updatedAt":2,"content":{}}"#;
        assert_eq!(deserialize_draft(legacy_newer), None);
    }

    #[test]
    fn legacy_version_field_is_accepted() {
        let raw = r#"{"version":1,"attemptId":"a","startedAt":1,"updatedAt":2,"content":{"task1":"one two"}}"#;
        let record = deserialize_draft(raw).unwrap();

        assert_eq!(record.attempt_id, "a");
        assert_eq!(record.content.task1_word_count, 2);
        assert_eq!(record.content.task2, "");
    }

    #[test]
    fn malformed_input_is_none() {
        assert_eq!(deserialize_draft("not-json"), None);
        assert_eq!(deserialize_draft(r#"{"attemptId": ""}"#), None);
        assert_eq!(deserialize_draft("[1,2,3]"), None);
        assert_eq!(deserialize_draft(r#"{"v":"one","attemptId":"a"}"#), None);
    }

    #[test]
    fn sanitizing_restores_timestamp_invariant() {
        let raw = r#"{"v":1,"attemptId":"a","startedAt":5000,"updatedAt":10,"content":{"task1":3}}"#;
        let record = deserialize_draft(raw).unwrap();

        assert_eq!(record.updated_at, 5_000);
        assert_eq!(record.content.task1, "");
        assert_eq!(record.content.task1_word_count, 0);
    }

    #[test]
    fn negative_timestamps_are_clamped_to_epoch() {
        let raw = r#"{"v":1,"attemptId":"a","startedAt":-9223372036854775808,"updatedAt":-5,"syncedAt":-1,"content":{}}"#;
        let record = deserialize_draft(raw).unwrap();

        assert_eq!(record.started_at, 0);
        assert_eq!(record.updated_at, 0);
        assert_eq!(record.synced_at, Some(0));
    }

    #[test]
    fn update_never_moves_updated_at_backwards() {
        let record = sample();
        let updated = update_draft_content(&record, DraftContent::new("x", "y"), 10);

        assert_eq!(updated.updated_at, 6_000);
        assert_eq!(updated.attempt_id, record.attempt_id);
    }
}
