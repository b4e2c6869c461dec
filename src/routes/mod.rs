//! # 라우트 핸들러 모듈
//!
//! 모든 엔드포인트는 `/api` 아래에 있고, `health`를 뺀 나머지는 Bearer 토큰이 필요합니다.
//!
//! | 메서드 | 경로 | 핸들러 |
//! |--------|------|--------|
//! | GET | /api/health | `health::health_check` |
//! | POST | /api/mock/writing/attempts | `attempts::create_attempt` |
//! | GET | /api/mock/writing/attempts/{id} | `attempts::get_attempt` |
//! | GET | /api/mock/writing/attempts/{id}/responses | `attempts::list_attempt_responses` |
//! | GET, PUT | /api/mock/writing/drafts/{attempt_id} | `drafts::fetch_draft`, `drafts::put_draft` |
//! | POST | /api/mock/writing/submit | `writing::submit_writing` |
//! | POST | /api/mock/writing/events | `writing::record_event` |
//! | GET, POST | /api/mock/checkpoints | `checkpoints::list_checkpoints`, `checkpoints::create_checkpoint` |

pub mod attempts;
pub mod checkpoints;
pub mod drafts;
pub mod health;
pub mod writing;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 모든 핸들러가 공유하는 상태. `SqlitePool`은 내부가 Arc라 clone이 싸게 끝납니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
    /// `latest=false` 목록 조회에서 `limit`이 없을 때의 개수
    pub checkpoint_list_limit: i64,
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/mock/writing/attempts", post(attempts::create_attempt))
        .route("/mock/writing/attempts/{id}", get(attempts::get_attempt))
        .route(
            "/mock/writing/attempts/{id}/responses",
            get(attempts::list_attempt_responses),
        )
        .route(
            "/mock/writing/drafts/{attempt_id}",
            get(drafts::fetch_draft).put(drafts::put_draft),
        )
        .route("/mock/writing/submit", post(writing::submit_writing))
        .route("/mock/writing/events", post(writing::record_event))
        .route(
            "/mock/checkpoints",
            get(checkpoints::list_checkpoints).post(checkpoints::create_checkpoint),
        )
        .with_state(state);

    // 개발 환경 기준으로 모든 출처를 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
