use serde::{Deserialize, Serialize};

/// `exam_attempts` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamAttempt {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub module: String,
    /// "in_progress" | "submitted"
    pub status: String,
    pub duration_seconds: Option<i64>,
    pub started_at: String,
    pub submitted_at: Option<String>,
}

impl ExamAttempt {
    pub const IN_PROGRESS: &'static str = "in_progress";
    pub const SUBMITTED: &'static str = "submitted";

    pub fn is_submitted(&self) -> bool {
        self.status == Self::SUBMITTED
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptRequest {
    pub duration_seconds: Option<i64>,
}
