use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 시험 중 발생한 이벤트 (탭 이탈 `blur`, 복귀 `focus`, 제출 `submit`)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamEvent {
    pub id: String,
    pub attempt_id: String,
    pub user_id: String,
    pub event_type: String,
    pub payload: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub attempt_id: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

pub const EVENT_TYPES: [&str; 4] = ["blur", "focus", "submit", "resume"];
