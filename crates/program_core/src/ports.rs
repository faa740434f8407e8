//! crates/program_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the program engine's collaborators.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage or catalog implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AnswerItem, AnswerProfile, DailySession, DayNumber, NewDailySession, Video, WatchKey,
    WatchRecord,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read access to the video catalog, plus the cached-duration write-back.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// All videos currently visible to end users.
    async fn list_publishable_videos(&self) -> PortResult<Vec<Video>>;

    async fn get_video(&self, video_id: &str) -> PortResult<Option<Video>>;

    /// Must be idempotent.
    async fn update_cached_duration(&self, video_id: &str, seconds: f64) -> PortResult<()>;
}

/// Storage for watch records, keyed uniquely by (user, day, video).
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn get_watch_record(&self, key: &WatchKey) -> PortResult<Option<WatchRecord>>;

    /// All records of one user for one day, oldest first.
    async fn list_watch_records_for_day(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Vec<WatchRecord>>;

    /// Inserts a record unless one already exists for its key.
    /// Returns `false` when another writer created the key first.
    async fn insert_watch_record(&self, record: &WatchRecord) -> PortResult<bool>;

    /// Replaces the stored record only if its version still equals `expected_version`.
    /// Returns `false` when the stored version moved on.
    async fn replace_watch_record(
        &self,
        record: &WatchRecord,
        expected_version: i64,
    ) -> PortResult<bool>;
}

/// Storage for submitted daily sessions, keyed uniquely by (user, day).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_session(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Option<DailySession>>;

    async fn list_sessions(&self, user_id: Uuid) -> PortResult<Vec<DailySession>>;

    /// Fails with `PortError::Conflict` if the user already has a session for that day.
    async fn create_session(&self, session: NewDailySession) -> PortResult<DailySession>;
}

/// Storage for onboarding-quiz answers.
#[async_trait]
pub trait AnswerProfileStore: Send + Sync {
    async fn get_answers(&self, user_id: Uuid) -> PortResult<Option<AnswerProfile>>;

    /// Replaces the whole ordered answer list of the user.
    async fn save_answers(&self, user_id: Uuid, answers: Vec<AnswerItem>)
        -> PortResult<AnswerProfile>;
}
