//! # 서버 설정
//!
//! `.env` 파일이나 시스템 환경변수에서 값을 읽습니다.
//!
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: Bearer 토큰 검증용 비밀키 (필수)
//! - `HOST`: 바인딩 주소 (기본값 `0.0.0.0`)
//! - `PORT`: 포트 (기본값 3000)
//! - `CHECKPOINT_LIST_LIMIT`: 체크포인트 목록 조회 기본 개수 (기본값 50, 1..=200)

use std::env;

/// 체크포인트 목록 조회에서 허용하는 최대 개수
pub const MAX_CHECKPOINT_LIST_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct Config {
    /// 예: "sqlite:data/gramorx.db?mode=rwc"
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub checkpoint_list_limit: i64,
}

impl Config {
    /// `DATABASE_URL`과 `JWT_SECRET`이 없으면 에러, 나머지는 기본값을 씁니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            checkpoint_list_limit: clamp_list_limit(
                env::var("CHECKPOINT_LIST_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(50),
            ),
        })
    }
}

pub fn clamp_list_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_CHECKPOINT_LIST_LIMIT)
}
