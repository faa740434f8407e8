//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of every engine port. Used by the test suite and by
//! `STORE_BACKEND=memory` for local development. Each map sits behind its own lock,
//! so the compare-and-swap on watch records is atomic per call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use program_core::domain::{
    AnswerItem, AnswerProfile, DailySession, DayNumber, NewDailySession, Video, WatchKey,
    WatchRecord,
};
use program_core::ports::{
    AnswerProfileStore, PortError, PortResult, SessionStore, VideoCatalog, WatchStore,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    videos: RwLock<Vec<Video>>,
    watches: RwLock<HashMap<WatchKey, WatchRecord>>,
    sessions: RwLock<HashMap<(Uuid, DayNumber), DailySession>>,
    profiles: RwLock<HashMap<Uuid, AnswerProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a catalog entry.
    pub async fn upsert_video(&self, video: Video) {
        let mut videos = self.videos.write().await;
        match videos.iter_mut().find(|v| v.id == video.id) {
            Some(existing) => *existing = video,
            None => videos.push(video),
        }
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl VideoCatalog for MemoryStore {
    async fn list_publishable_videos(&self) -> PortResult<Vec<Video>> {
        Ok(self
            .videos
            .read()
            .await
            .iter()
            .filter(|v| v.is_publishable())
            .cloned()
            .collect())
    }

    async fn get_video(&self, video_id: &str) -> PortResult<Option<Video>> {
        Ok(self
            .videos
            .read()
            .await
            .iter()
            .find(|v| v.id == video_id)
            .cloned())
    }

    async fn update_cached_duration(&self, video_id: &str, seconds: f64) -> PortResult<()> {
        let mut videos = self.videos.write().await;
        let video = videos
            .iter_mut()
            .find(|v| v.id == video_id)
            .ok_or_else(|| PortError::NotFound(format!("Video {video_id} not found")))?;
        video.duration = Some(seconds);
        Ok(())
    }
}

#[async_trait]
impl WatchStore for MemoryStore {
    async fn get_watch_record(&self, key: &WatchKey) -> PortResult<Option<WatchRecord>> {
        Ok(self.watches.read().await.get(key).cloned())
    }

    async fn list_watch_records_for_day(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Vec<WatchRecord>> {
        let mut records: Vec<WatchRecord> = self
            .watches
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id && r.day_number == day_number)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        Ok(records)
    }

    async fn insert_watch_record(&self, record: &WatchRecord) -> PortResult<bool> {
        let mut watches = self.watches.write().await;
        let key = record.key();
        if watches.contains_key(&key) {
            return Ok(false);
        }
        watches.insert(key, record.clone());
        Ok(true)
    }

    async fn replace_watch_record(
        &self,
        record: &WatchRecord,
        expected_version: i64,
    ) -> PortResult<bool> {
        let mut watches = self.watches.write().await;
        match watches.get_mut(&record.key()) {
            Some(stored) if stored.version == expected_version => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> PortResult<Option<DailySession>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&(user_id, day_number))
            .cloned())
    }

    async fn list_sessions(&self, user_id: Uuid) -> PortResult<Vec<DailySession>> {
        let mut sessions: Vec<DailySession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.day_number);
        Ok(sessions)
    }

    async fn create_session(&self, session: NewDailySession) -> PortResult<DailySession> {
        let mut sessions = self.sessions.write().await;
        let key = (session.user_id, session.day_number);
        if sessions.contains_key(&key) {
            return Err(PortError::Conflict(format!(
                "session for day {} already exists",
                session.day_number
            )));
        }
        let created = DailySession {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            day_number: session.day_number,
            answers: session.answers,
            feedback: session.feedback,
            submitted_at: Utc::now(),
        };
        sessions.insert(key, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl AnswerProfileStore for MemoryStore {
    async fn get_answers(&self, user_id: Uuid) -> PortResult<Option<AnswerProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save_answers(
        &self,
        user_id: Uuid,
        answers: Vec<AnswerItem>,
    ) -> PortResult<AnswerProfile> {
        let profile = AnswerProfile { user_id, answers };
        self.profiles.write().await.insert(user_id, profile.clone());
        Ok(profile)
    }
}
