//! Shared helpers for the API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::{DbAdapter, MemoryStore};
use api_lib::config::{Config, StoreBackend};
use api_lib::web::{api_router, state::AppState};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use program_core::{DayNumber, ProgramEngine, Video, VideoStatus};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;
use tracing::Level;
use uuid::Uuid;

/// Build a test `Config` with safe defaults.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        store_backend: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        db_acquire_timeout: Duration::from_secs(1),
        log_level: Level::DEBUG,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

pub fn engine_for(store: &Arc<MemoryStore>) -> ProgramEngine {
    ProgramEngine::new(store.clone(), store.clone(), store.clone(), store.clone())
}

/// Connects to `DATABASE_URL` and applies the migrations.
///
/// Returns `None` when the variable is unset, so the Postgres tests pass trivially on
/// machines without a database.
pub async fn postgres_adapter() -> Option<(PgPool, Arc<DbAdapter>)> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .unwrap();
    let adapter = Arc::new(DbAdapter::new(pool.clone()));
    adapter.run_migrations().await.unwrap();
    Some((pool, adapter))
}

pub fn db_engine(adapter: &Arc<DbAdapter>) -> ProgramEngine {
    ProgramEngine::new(
        adapter.clone(),
        adapter.clone(),
        adapter.clone(),
        adapter.clone(),
    )
}

/// Inserts a draft video with a unique id. Drafts stay out of the published catalog,
/// so tests sharing one database do not change each other's completion results.
pub async fn seed_draft_video(pool: &PgPool, duration: Option<f64>) -> String {
    let id = format!("video-{}", Uuid::new_v4());
    sqlx::query(
        "INSERT INTO videos (id, title, status, duration_seconds) VALUES ($1, $2, 'draft', $3)",
    )
    .bind(&id)
    .bind(format!("Lesson {id}"))
    .bind(duration)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub fn video(id: &str, status: VideoStatus, duration: Option<f64>) -> Video {
    Video {
        id: id.to_string(),
        title: format!("Lesson {id}"),
        status,
        duration,
    }
}

/// A store whose catalog holds the given published videos, each 100 seconds long.
pub async fn store_with_videos(ids: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for id in ids {
        store
            .upsert_video(video(id, VideoStatus::Published, Some(100.0)))
            .await;
    }
    store
}

pub fn day(n: i64) -> DayNumber {
    DayNumber::new(n).unwrap()
}

pub fn six_answers() -> Vec<String> {
    (1..=6).map(|i| format!("answer {i}")).collect()
}

/// Build the application router over the given engine, mirroring `bin/api.rs`.
pub fn build_test_app(engine: ProgramEngine) -> Router {
    let state = Arc::new(AppState {
        engine,
        config: Arc::new(test_config()),
    });
    api_router(state)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user_id: Option<Uuid>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
