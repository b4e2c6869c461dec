//! # 작문 채점 결과 모델
//!
//! `services::scoring`이 만들어 `POST /api/mock/writing/submit` 응답으로 내보내는 구조체들입니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// IELTS 작문 채점 기준 4가지의 밴드 점수
///
/// 키 이름은 기존 클라이언트와의 호환을 위해 snake_case를 유지합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandScores {
    pub task_response: f64,
    pub coherence_and_cohesion: f64,
    pub lexical_resource: f64,
    pub grammatical_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionFeedback {
    pub band: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingFeedback {
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub per_criterion: BTreeMap<String, CriterionFeedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingScore {
    pub overall_band: f64,
    pub band_scores: BandScores,
    pub feedback: WritingFeedback,
    pub word_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    pub version: String,
}
