//! # 텍스트 통계 유틸리티
//!
//! 에세이 단어 수 계산. 시험실의 최소 단어 수 안내, 초안 코덱의 단어 수 보정,
//! 서버 채점기가 모두 이 함수를 사용합니다.

/// 둥근 따옴표와 하이픈/대시 변형을 표준 형태로 바꾸고, 소프트 하이픈은 제거합니다.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\u{00AD}')
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

/// 공백으로 나눈 뒤 앞뒤 구두점을 떼어낸 토큰들.
/// 글자나 숫자가 하나도 없는 토큰(예: "—", "...")은 제외됩니다.
pub fn word_tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(str::to_string)
        .collect()
}

/// 텍스트의 단어 수를 계산합니다.
///
/// 연속된 공백/탭/줄바꿈은 하나의 구분자로 취급하며,
/// 빈 문자열이나 공백뿐인 입력은 0을 반환합니다.
pub fn count_words(text: &str) -> u32 {
    if text.trim().is_empty() {
        return 0;
    }
    word_tokens(text).len() as u32
}
