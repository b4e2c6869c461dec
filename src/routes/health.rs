//! `GET /api/health` → `{ "status": "ok" }`
//!
//! 로드밸런서와 컨테이너 헬스체크용. 인증이 필요 없습니다.

use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}
