//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the engine's storage and catalog ports. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use program_core::domain::{
    AnswerItem, AnswerProfile, DailySession, DayNumber, NewDailySession, Video, VideoStatus,
    WatchKey, WatchRecord,
};
use program_core::ports::{
    AnswerProfileStore, PortError, PortResult, SessionStore, VideoCatalog, WatchStore,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every engine port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn day_from_row(day_number: i16) -> PortResult<DayNumber> {
    DayNumber::new(i64::from(day_number)).map_err(|e| PortError::Unexpected(e.to_string()))
}

fn day_to_row(day_number: DayNumber) -> i16 {
    i16::from(day_number.get())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct VideoRecord {
    id: String,
    title: String,
    status: String,
    duration_seconds: Option<f64>,
}
impl VideoRecord {
    fn to_domain(self) -> Video {
        let status = match self.status.as_str() {
            "published" => VideoStatus::Published,
            _ => VideoStatus::Draft,
        };
        Video {
            id: self.id,
            title: self.title,
            status,
            duration: self.duration_seconds,
        }
    }
}

#[derive(FromRow)]
struct WatchRow {
    user_id: Uuid,
    day_number: i16,
    video_id: String,
    watch_progress: f64,
    is_completed: bool,
    watched_duration: f64,
    last_position: f64,
    max_watched_position: f64,
    video_duration: f64,
    has_skipped_forward: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}
impl WatchRow {
    fn to_domain(self) -> PortResult<WatchRecord> {
        Ok(WatchRecord {
            user_id: self.user_id,
            day_number: day_from_row(self.day_number)?,
            video_id: self.video_id,
            watch_progress: self.watch_progress,
            is_completed: self.is_completed,
            watched_duration: self.watched_duration,
            last_position: self.last_position,
            max_watched_position: self.max_watched_position,
            video_duration: self.video_duration,
            has_skipped_forward: self.has_skipped_forward,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    day_number: i16,
    answers: Vec<String>,
    feedback: Option<String>,
    submitted_at: DateTime<Utc>,
}
impl SessionRow {
    fn to_domain(self) -> PortResult<DailySession> {
        Ok(DailySession {
            id: self.id,
            user_id: self.user_id,
            day_number: day_from_row(self.day_number)?,
            answers: self.answers,
            feedback: self.feedback,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(FromRow)]
struct AnswerRow {
    question_id: i32,
    answer: String,
}

const WATCH_COLUMNS: &str = "user_id, day_number, video_id, watch_progress, is_completed, \
     watched_duration, last_position, max_watched_position, video_duration, \
     has_skipped_forward, completed_at, created_at, updated_at, version";

const SESSION_COLUMNS: &str = "id, user_id, day_number, answers, feedback, submitted_at";

//=========================================================================================
// `VideoCatalog` Trait Implementation
//=========================================================================================

#[async_trait]
impl VideoCatalog for DbAdapter {
    async fn list_publishable_videos(&self) -> PortResult<Vec<Video>> {
        let records = sqlx::query_as::<_, VideoRecord>(
            "SELECT id, title, status, duration_seconds FROM videos \
             WHERE status = 'published' ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_video(&self, video_id: &str) -> PortResult<Option<Video>> {
        let record = sqlx::query_as::<_, VideoRecord>(
            "SELECT id, title, status, duration_seconds FROM videos WHERE id = $1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn update_cached_duration(&self, video_id: &str, seconds: f64) -> PortResult<()> {
        sqlx::query("UPDATE videos SET duration_seconds = $1 WHERE id = $2")
            .bind(seconds)
            .bind(video_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `WatchStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl WatchStore for DbAdapter {
    async fn get_watch_record(&self, key: &WatchKey) -> PortResult<Option<WatchRecord>> {
        let row = sqlx::query_as::<_, WatchRow>(&format!(
            "SELECT {WATCH_COLUMNS} FROM watch_records \
             WHERE user_id = $1 AND day_number = $2 AND video_id = $3"
        ))
        .bind(key.user_id)
        .bind(day_to_row(key.day_number))
        .bind(&key.video_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(WatchRow::to_domain).transpose()
    }

    async fn list_watch_records_for_day(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Vec<WatchRecord>> {
        let rows = sqlx::query_as::<_, WatchRow>(&format!(
            "SELECT {WATCH_COLUMNS} FROM watch_records \
             WHERE user_id = $1 AND day_number = $2 ORDER BY created_at ASC, video_id ASC"
        ))
        .bind(user_id)
        .bind(day_to_row(day_number))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(WatchRow::to_domain).collect()
    }

    async fn insert_watch_record(&self, record: &WatchRecord) -> PortResult<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO watch_records ({WATCH_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (user_id, day_number, video_id) DO NOTHING"
        ))
        .bind(record.user_id)
        .bind(day_to_row(record.day_number))
        .bind(&record.video_id)
        .bind(record.watch_progress)
        .bind(record.is_completed)
        .bind(record.watched_duration)
        .bind(record.last_position)
        .bind(record.max_watched_position)
        .bind(record.video_duration)
        .bind(record.has_skipped_forward)
        .bind(record.completed_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.version)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn replace_watch_record(
        &self,
        record: &WatchRecord,
        expected_version: i64,
    ) -> PortResult<bool> {
        // The version predicate guarantees `record` was computed from the stored row.
        // Progress is derived from the reconciled duration and may go down, so it is
        // written as is; only the monotonic and sticky columns are guarded.
        let result = sqlx::query(
            "UPDATE watch_records SET \
                 watch_progress = $4, \
                 is_completed = is_completed OR $5, \
                 watched_duration = GREATEST(watched_duration, $6), \
                 last_position = $7, \
                 max_watched_position = GREATEST(max_watched_position, $8), \
                 video_duration = $9, \
                 has_skipped_forward = $10, \
                 completed_at = COALESCE(completed_at, $11), \
                 updated_at = $12, \
                 version = $13 \
             WHERE user_id = $1 AND day_number = $2 AND video_id = $3 AND version = $14",
        )
        .bind(record.user_id)
        .bind(day_to_row(record.day_number))
        .bind(&record.video_id)
        .bind(record.watch_progress)
        .bind(record.is_completed)
        .bind(record.watched_duration)
        .bind(record.last_position)
        .bind(record.max_watched_position)
        .bind(record.video_duration)
        .bind(record.has_skipped_forward)
        .bind(record.completed_at)
        .bind(record.updated_at)
        .bind(record.version)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn find_session(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Option<DailySession>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM daily_sessions WHERE user_id = $1 AND day_number = $2"
        ))
        .bind(user_id)
        .bind(day_to_row(day_number))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(SessionRow::to_domain).transpose()
    }

    async fn list_sessions(&self, user_id: Uuid) -> PortResult<Vec<DailySession>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM daily_sessions WHERE user_id = $1 ORDER BY day_number ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(SessionRow::to_domain).collect()
    }

    async fn create_session(&self, session: NewDailySession) -> PortResult<DailySession> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "INSERT INTO daily_sessions (id, user_id, day_number, answers, feedback) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(day_to_row(session.day_number))
        .bind(&session.answers)
        .bind(&session.feedback)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                PortError::Conflict(format!(
                    "session for day {} already exists",
                    session.day_number
                ))
            }
            _ => unexpected(e),
        })?;
        row.to_domain()
    }
}

//=========================================================================================
// `AnswerProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnswerProfileStore for DbAdapter {
    async fn get_answers(&self, user_id: Uuid) -> PortResult<Option<AnswerProfile>> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            "SELECT question_id, answer FROM answer_items WHERE user_id = $1 ORDER BY position ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        if rows.is_empty() {
            return Ok(None);
        }
        let answers = rows
            .into_iter()
            .map(|r| AnswerItem {
                question_id: r.question_id,
                answer: r.answer,
            })
            .collect();
        Ok(Some(AnswerProfile { user_id, answers }))
    }

    async fn save_answers(
        &self,
        user_id: Uuid,
        answers: Vec<AnswerItem>,
    ) -> PortResult<AnswerProfile> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM answer_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        for (position, item) in answers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO answer_items (user_id, position, question_id, answer) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(user_id)
            .bind(position as i32)
            .bind(item.question_id)
            .bind(&item.answer)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(AnswerProfile { user_id, answers })
    }
}
