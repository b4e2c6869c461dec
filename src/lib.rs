//! # GramorX 작문 시험 자동저장
//!
//! 두 부분으로 이루어져 있습니다.
//!
//! - 클라이언트 측: `autosave`(초안 코덱, 로컬 저장소, 자동저장 세션과 레지스트리, 동기화 정책)와
//!   그것들을 묶는 `exam_room`
//! - 서버 측: 시험실이 통신하는 Axum 서버 (`routes`, `db`, `models`, `services`)
//!
//! 바이너리(`main.rs`)는 서버만 띄웁니다. 통합 테스트는 같은 라우터를 임의 포트에 띄우고
//! `exam_room::HttpWritingApi`로 시험실 전체 흐름을 돌립니다.

pub mod autosave;
pub mod config;
pub mod db;
pub mod error;
pub mod exam_room;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
