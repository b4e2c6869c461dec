//! # 체크포인트 답안 병합
//!
//! `answers_delta`가 있는 체크포인트 저장 요청은 이전 체크포인트의 `answers`와 병합됩니다.
//! 우선순위: 이전 체크포인트 < 요청 스냅샷의 answers < answers_delta

use serde_json::{Map, Value};

fn as_record(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object)
}

/// 저장할 스냅샷을 만듭니다.
///
/// - 스냅샷이 객체가 아니면 빈 객체로 취급합니다.
/// - `delta`가 없거나 비어 있으면 `previous`는 보지 않습니다.
pub fn merge_checkpoint_snapshot(
    snapshot: &Value,
    previous: Option<&Value>,
    delta: Option<&Map<String, Value>>,
) -> Value {
    let mut merged = snapshot.as_object().cloned().unwrap_or_default();

    let Some(delta) = delta.filter(|d| !d.is_empty()) else {
        return Value::Object(merged);
    };

    let mut answers = as_record(previous.and_then(|p| p.get("answers")))
        .cloned()
        .unwrap_or_default();
    if let Some(current) = as_record(merged.get("answers")) {
        answers.extend(current.clone());
    }
    answers.extend(delta.clone());

    merged.insert("answers".to_string(), Value::Object(answers));
    Value::Object(merged)
}
