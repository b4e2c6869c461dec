//! # 서비스 모듈
//!
//! DB나 HTTP에 의존하지 않는 도메인 로직입니다.
//! - `text`: 단어 수/글자 수
//! - `scoring`: 기본 작문 채점기
//! - `checkpoint`: 체크포인트 답안 병합

pub mod checkpoint;
pub mod scoring;
pub mod text;
