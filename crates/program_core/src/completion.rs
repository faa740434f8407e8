//! crates/program_core/src/completion.rs
//!
//! Decides whether a day's video-watching requirement is satisfied.
//! Nothing is cached: the catalog can change between calls.

use uuid::Uuid;

use crate::domain::{DayNumber, Video, WatchRecord};
use crate::engine::ProgramEngine;
use crate::error::ProgramResult;

/// True iff every publishable video has a completed record among `records`.
/// An empty catalog never satisfies the requirement.
pub fn requirement_satisfied(videos: &[Video], records: &[WatchRecord]) -> bool {
    let mut publishable = videos.iter().filter(|v| v.is_publishable()).peekable();
    if publishable.peek().is_none() {
        return false;
    }
    publishable.all(|video| {
        records
            .iter()
            .any(|r| r.video_id == video.id && r.is_completed)
    })
}

impl ProgramEngine {
    pub async fn is_day_video_complete(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> ProgramResult<bool> {
        let videos = self.catalog.list_publishable_videos().await?;
        if videos.is_empty() {
            return Ok(false);
        }
        self.day_requirement_met(&videos, user_id, day_number).await
    }

    /// Checks one day against an already fetched catalog listing.
    pub(crate) async fn day_requirement_met(
        &self,
        videos: &[Video],
        user_id: Uuid,
        day_number: DayNumber,
    ) -> ProgramResult<bool> {
        let records = self
            .watches
            .list_watch_records_for_day(user_id, day_number)
            .await?;
        Ok(requirement_satisfied(videos, &records))
    }
}
