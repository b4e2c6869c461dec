//! # 기본(baseline) 작문 채점기
//!
//! 에세이를 IELTS 스타일 밴드 점수로 바꾸는 결정적(deterministic) 휴리스틱입니다.
//! 네 가지 기준을 각각 3.0 ~ 9.0 범위로 계산하고 소수 첫째 자리로 반올림하며,
//! 종합 밴드는 네 기준의 평균입니다.
//!
//! | 기준 | 근거 |
//! |------|------|
//! | task_response | 목표 단어 수 대비 작성량 |
//! | coherence_and_cohesion | 문단 구분 |
//! | lexical_resource | 어휘 다양성 |
//! | grammatical_range | 문장당 쉼표 비율(복문 사용) |

use std::collections::{BTreeMap, HashSet};

use crate::models::{BandScores, CriterionFeedback, WritingFeedback, WritingScore, WritingTask};
use crate::services::text::count_words;

pub const SCORING_VERSION: &str = "baseline-v1";

const MIN_BAND: f64 = 3.0;
const MAX_BAND: f64 = 9.0;

#[derive(Debug, Clone)]
pub struct ScoreContext<'a> {
    pub essay: &'a str,
    pub task: WritingTask,
    /// None이면 과제 기본값(150 / 250)을 사용
    pub word_target: Option<u32>,
    pub duration_seconds: Option<i64>,
}

struct CriterionScore {
    band: f64,
    rationale: &'static str,
}

fn clamp(value: f64, lower: f64, upper: f64) -> f64 {
    if value.is_nan() {
        return lower;
    }
    value.clamp(lower, upper)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn paragraph_count(essay: &str) -> usize {
    let trimmed = essay.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.split("\n\n").filter(|p| !p.is_empty()).count()
}

/// `.`, `!`, `?` 로 끝나는(또는 글 끝에서 잘린) 공백이 아닌 구간의 수
fn sentence_count(essay: &str) -> usize {
    let mut count = 0;
    let mut current = String::new();
    for c in essay.chars() {
        if matches!(c, '.' | '!' | '?') {
            if !current.is_empty() {
                if !current.trim().is_empty() {
                    count += 1;
                }
                current.clear();
            }
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        count += 1;
    }
    count
}

/// 글자·숫자·아포스트로피·하이픈으로 이루어진 단어들 (소문자)
fn lexical_words(essay: &str) -> Vec<String> {
    essay
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn lexical_variety(essay: &str) -> f64 {
    let words = lexical_words(essay);
    if words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| w.chars().count() > 2)
        .collect();
    unique.len() as f64 / words.len() as f64
}

fn task_response(ctx: &ScoreContext<'_>, total_words: u32) -> CriterionScore {
    let target = ctx.word_target.unwrap_or_else(|| ctx.task.min_words());
    let ratio = if target == 0 {
        1.0
    } else {
        f64::from(total_words) / f64::from(target)
    };
    let coverage = clamp(ratio, 0.0, 1.2);
    let mut band = 5.0 + coverage * 4.0;
    if coverage < 0.75 {
        band -= 1.5;
    }
    if coverage < 0.5 {
        band -= 2.0;
    }
    let rationale = if coverage >= 1.0 {
        "Meets recommended word count and likely covers main points."
    } else if coverage >= 0.75 {
        "Slightly below recommended word count. Elaborating key ideas would strengthen Task Response."
    } else {
        "Significantly below recommended word count. Add more detail to fully address the prompt."
    };
    CriterionScore { band: round1(clamp(band, MIN_BAND, MAX_BAND)), rationale }
}

fn coherence(essay: &str, paragraphs: usize) -> CriterionScore {
    let has_intro = paragraphs >= 2;
    let has_clear_paragraphs = paragraphs >= 3;
    let mut band = 5.5;
    if has_intro {
        band += 1.0;
    }
    if has_clear_paragraphs {
        band += 1.2;
    }
    if essay.contains("Firstly") || essay.contains("In conclusion") {
        band += 0.3;
    }
    let rationale = if has_clear_paragraphs {
        "Paragraphing indicates clear progression of ideas."
    } else if has_intro {
        "Consider adding separate body paragraphs to improve cohesion."
    } else {
        "Introduce distinct paragraphs to clarify structure."
    };
    CriterionScore { band: round1(clamp(band, MIN_BAND, MAX_BAND)), rationale }
}

fn lexical(variety: f64, total_words: u32) -> CriterionScore {
    let mut band = 5.0 + variety * 8.0;
    if total_words < 120 {
        band -= 1.2;
    }
    let rationale = if variety > 0.4 {
        "Shows a solid range of vocabulary."
    } else {
        "Repetition detected. Introduce synonyms and topic-specific vocabulary."
    };
    CriterionScore { band: round1(clamp(band, MIN_BAND, MAX_BAND)), rationale }
}

fn grammar(essay: &str, sentences: usize) -> CriterionScore {
    let commas = essay.chars().filter(|c| *c == ',').count();
    let complex_ratio = if sentences == 0 {
        0.0
    } else {
        clamp(commas as f64 / sentences as f64, 0.0, 1.0)
    };
    let mut band = 5.2 + complex_ratio * 3.5;
    if sentences < 6 {
        band -= 0.8;
    }
    let rationale = if complex_ratio > 0.4 {
        "Complex sentence structures identified. Maintain grammatical accuracy."
    } else {
        "Try varying sentence length and structure to showcase grammatical range."
    };
    CriterionScore { band: round1(clamp(band, MIN_BAND, MAX_BAND)), rationale }
}

fn build_feedback(criteria: &[(&str, &CriterionScore)]) -> WritingFeedback {
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    let mut per_criterion = BTreeMap::new();

    for (name, score) in criteria {
        if score.band >= 7.0 {
            strengths.push(score.rationale.to_string());
        } else if score.band <= 5.5 {
            improvements.push(score.rationale.to_string());
        }
        per_criterion.insert(
            name.to_string(),
            CriterionFeedback {
                band: score.band,
                feedback: score.rationale.to_string(),
            },
        );
    }

    if strengths.is_empty() {
        strengths.push("Solid foundation. Keep practising to further refine your essay.".to_string());
    }
    if improvements.is_empty() {
        improvements.push("Focus on polishing examples and proofreading for minor slips.".to_string());
    }

    WritingFeedback {
        summary: "Automated baseline feedback. Human tutors will be able to review in later phases."
            .to_string(),
        strengths,
        improvements,
        per_criterion,
    }
}

/// 에세이 하나를 채점합니다.
pub fn score_essay(ctx: &ScoreContext<'_>) -> WritingScore {
    let total_words = count_words(ctx.essay);
    let paragraphs = paragraph_count(ctx.essay);
    let sentences = sentence_count(ctx.essay);
    let variety = lexical_variety(ctx.essay);

    let tr = task_response(ctx, total_words);
    let cc = coherence(ctx.essay, paragraphs);
    let lr = lexical(variety, total_words);
    let gr = grammar(ctx.essay, sentences);

    let overall_band = round1((tr.band + cc.band + lr.band + gr.band) / 4.0);
    let band_scores = BandScores {
        task_response: tr.band,
        coherence_and_cohesion: cc.band,
        lexical_resource: lr.band,
        grammatical_range: gr.band,
    };
    let feedback = build_feedback(&[
        ("task_response", &tr),
        ("coherence_and_cohesion", &cc),
        ("lexical_resource", &lr),
        ("grammatical_range", &gr),
    ]);

    WritingScore {
        overall_band,
        band_scores,
        feedback,
        word_count: total_words,
        duration_seconds: ctx.duration_seconds,
        version: SCORING_VERSION.to_string(),
    }
}
