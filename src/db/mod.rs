//! # 데이터베이스 접근 계층
//!
//! 라우트 핸들러(routes/)가 이 모듈의 함수를 호출합니다. 대부분 `&SqlitePool`을 받고
//! `Result<_, AppError>`를 돌려줍니다. 제출 경로에서 함께 쓰이는 쓰기 함수
//! (`upsert_response`, `mark_submitted`, `insert_event`)는 트랜잭션 안에서도 돌 수 있도록
//! `SqliteExecutor`를 받습니다.
//!
//! - `attempts`: 시험 시도
//! - `drafts`: 서버 측 초안 사본
//! - `responses`: 과제별 채점 결과
//! - `events`: 포커스/제출 이벤트
//! - `checkpoints`: 모의고사 섹션 체크포인트

pub mod attempts;
pub mod checkpoints;
pub mod drafts;
pub mod events;
pub mod responses;

pub use attempts::*;
pub use checkpoints::*;
pub use drafts::*;
pub use events::*;
pub use responses::*;
