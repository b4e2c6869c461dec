//! # 데이터 모델 모듈
//!
//! - `attempt`: 시험 시도(exam_attempts)
//! - `checkpoint`: 모의고사 섹션 체크포인트
//! - `draft`: 작문 초안 (클라이언트 자동저장과 서버 동기화가 공유)
//! - `event`: 시험 중 포커스/제출 이벤트
//! - `score`: 채점 결과
//! - `submission`: 제출 요청/응답

pub mod attempt;
pub mod checkpoint;
pub mod draft;
pub mod event;
pub mod score;
pub mod submission;

pub use attempt::*;
pub use checkpoint::*;
pub use draft::*;
pub use event::*;
pub use score::*;
pub use submission::*;
