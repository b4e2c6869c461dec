//! # 작문 제출 요청/응답 모델
//!
//! `POST /api/mock/writing/submit`
//! - 요청: `{ attemptId, durationSeconds, tasks: { task1?: {essay, promptId}, task2?: {...} } }`
//! - 응답: `{ ok, attemptId, results: { task1?, task2? } }`
//!
//! 시험실(`ExamRoom`)과 서버 라우트가 같은 타입을 사용합니다.

use serde::{Deserialize, Serialize};

use super::{WritingScore, WritingTask};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmission {
    pub essay: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTasks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task1: Option<TaskSubmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task2: Option<TaskSubmission>,
}

impl SubmissionTasks {
    pub fn get(&self, task: WritingTask) -> Option<&TaskSubmission> {
        match task {
            WritingTask::Task1 => self.task1.as_ref(),
            WritingTask::Task2 => self.task2.as_ref(),
        }
    }

    /// 본문이 공백뿐인 과제는 제출되지 않은 것으로 봅니다.
    pub fn has_any(&self) -> bool {
        WritingTask::ALL
            .iter()
            .filter_map(|task| self.get(*task))
            .any(|submission| !submission.essay.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub attempt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub tasks: SubmissionTasks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task1: Option<WritingScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task2: Option<WritingScore>,
}

impl TaskResults {
    pub fn set(&mut self, task: WritingTask, score: WritingScore) {
        match task {
            WritingTask::Task1 => self.task1 = Some(score),
            WritingTask::Task2 => self.task2 = Some(score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub attempt_id: String,
    pub results: TaskResults,
}

/// `writing_responses` 테이블에 저장할 한 과제의 채점 결과
#[derive(Debug, Clone)]
pub struct NewWritingResponse<'a> {
    pub user_id: &'a str,
    pub attempt_id: &'a str,
    pub prompt_id: Option<&'a str>,
    pub task: WritingTask,
    pub answer_text: &'a str,
    pub score: &'a WritingScore,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WritingResponseSummary {
    pub task: String,
    pub prompt_id: Option<String>,
    pub word_count: i64,
    pub overall_band: f64,
    pub evaluation_version: String,
    pub submitted_at: String,
}
