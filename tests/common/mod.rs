// tests/common/mod.rs

#![allow(dead_code)]

use gramorx::middleware::auth::create_access_token;
use gramorx::routes::{create_router, AppState};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// 인메모리 SQLite 위에 서버를 임의 포트로 띄웁니다.
pub async fn spawn_app() -> TestApp {
    // 인메모리 DB는 연결마다 따로 생기므로 연결 하나를 계속 붙잡아 둡니다.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: JWT_SECRET.to_string(),
        checkpoint_list_limit: 50,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    }
}

pub fn token_for(user_id: &str) -> String {
    create_access_token(user_id, JWT_SECRET).expect("Failed to create token")
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    /// 사용자 `user_id`로 작문 시도를 하나 만들고 ID를 돌려줍니다.
    pub async fn create_attempt(&self, user_id: &str) -> String {
        let response = self
            .client
            .post(self.url("/mock/writing/attempts"))
            .bearer_auth(token_for(user_id))
            .json(&json!({ "durationSeconds": 3600 }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn count_events(&self, attempt_id: &str, event_type: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM exam_events WHERE attempt_id = ? AND event_type = ?")
            .bind(attempt_id)
            .bind(event_type)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
