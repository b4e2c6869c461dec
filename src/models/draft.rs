//! # 작문 초안(Draft) 모델
//!
//! 시험실에서 작성 중인 두 과제(Task 1, Task 2)의 본문과 단어 수,
//! 그리고 서버 동기화 워터마크를 담는 레코드입니다.
//!
//! 클라이언트(로컬 자동저장)와 서버(`writing_drafts` 테이블)가 같은 타입을 공유합니다.
//! 모든 시각은 **epoch 밀리초(i64)** 입니다.

use serde::{Deserialize, Serialize};

use crate::services::text::count_words;

/// IELTS 작문 과제 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingTask {
    Task1,
    Task2,
}

impl WritingTask {
    pub const ALL: [WritingTask; 2] = [WritingTask::Task1, WritingTask::Task2];

    /// 과제별 권장 최소 단어 수 (Task 1 = 150, Task 2 = 250)
    pub fn min_words(self) -> u32 {
        match self {
            WritingTask::Task1 => 150,
            WritingTask::Task2 => 250,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WritingTask::Task1 => "task1",
            WritingTask::Task2 => "task2",
        }
    }
}

impl std::fmt::Display for WritingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 작성 중인 에세이 본문과 파생된 단어 수
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftContent {
    pub task1: String,
    pub task2: String,
    pub task1_word_count: u32,
    pub task2_word_count: u32,
}

impl DraftContent {
    /// 본문으로부터 단어 수를 계산하여 생성합니다.
    pub fn new(task1: impl Into<String>, task2: impl Into<String>) -> Self {
        let task1 = task1.into();
        let task2 = task2.into();
        Self {
            task1_word_count: count_words(&task1),
            task2_word_count: count_words(&task2),
            task1,
            task2,
        }
    }

    pub fn text(&self, task: WritingTask) -> &str {
        match task {
            WritingTask::Task1 => &self.task1,
            WritingTask::Task2 => &self.task2,
        }
    }

    pub fn word_count(&self, task: WritingTask) -> u32 {
        match task {
            WritingTask::Task1 => self.task1_word_count,
            WritingTask::Task2 => self.task2_word_count,
        }
    }

    /// 한 과제의 본문을 교체하고 해당 단어 수만 다시 셉니다.
    pub fn set_text(&mut self, task: WritingTask, text: impl Into<String>) {
        let text = text.into();
        let words = count_words(&text);
        match task {
            WritingTask::Task1 => {
                self.task1 = text;
                self.task1_word_count = words;
            }
            WritingTask::Task2 => {
                self.task2 = text;
                self.task2_word_count = words;
            }
        }
    }
}

/// 하나의 시험 시도(attempt)에 대한 초안 레코드
///
/// - `updated_at >= started_at` 이 항상 성립합니다.
/// - `synced_at`은 서버 상태가 로컬과 마지막으로 일치했던 시각입니다.
/// - `attempt_id`는 서버 측 `exam_attempts.id`와의 조인 키이며 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub attempt_id: String,
    pub started_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
    pub content: DraftContent,
}

/// `writing_drafts` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredDraft {
    pub attempt_id: String,
    pub user_id: String,
    /// 직렬화된 초안 (`{v, attemptId, startedAt, updatedAt, syncedAt?, content}`)
    pub payload: String,
    pub draft_updated_at: i64,
    pub task1_word_count: i64,
    pub task2_word_count: i64,
    pub synced_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_text_recounts_only_that_task() {
        let mut content = DraftContent::new("one two", "three");
        content.set_text(WritingTask::Task2, "four five six");

        assert_eq!(content.task1_word_count, 2);
        assert_eq!(content.word_count(WritingTask::Task2), 3);
        assert_eq!(content.text(WritingTask::Task2), "four five six");
    }

    #[test]
    fn writing_task_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&WritingTask::Task1).unwrap(), "\"task1\"");
        assert_eq!(WritingTask::Task2.min_words(), 250);
    }
}
