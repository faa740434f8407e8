//! crates/program_core/src/tracker.rs
//!
//! The watch tracker: the only writer of watch state.
//!
//! A progress report is folded into the previously stored record by [`apply_progress`],
//! a pure function, and the result is persisted with a compare-and-swap on the record
//! version. A lost race reloads and recomputes, so the monotonic position and the
//! sticky completion flag are always combined against the freshest stored state and
//! never against a client's stale view.

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{DayNumber, Video, WatchKey, WatchRecord};
use crate::engine::ProgramEngine;
use crate::error::{ProgramError, ProgramResult};

/// A forward jump larger than this between consecutive reports counts as a skip.
pub const SKIP_THRESHOLD_SECS: f64 = 5.0;
/// Reports before this position clear an earlier skip flag.
pub const REWIND_RESET_SECS: f64 = 10.0;
pub const COMPLETION_THRESHOLD_PERCENT: f64 = 95.0;
/// Reaching within this many seconds of the end completes the video even after a skip.
pub const NEAR_END_TOLERANCE_SECS: f64 = 1.0;
/// A reported duration must exceed the stored one by more than this to replace it.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

const MAX_SAVE_ATTEMPTS: usize = 8;

/// The current time at microsecond precision, the finest a `TIMESTAMPTZ` column keeps.
/// A record returned from a write must equal the same record read back later.
pub fn record_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

//=========================================================================================
// Progress Report
//=========================================================================================

/// A validated playback progress report from a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub user_id: Uuid,
    pub video_id: String,
    pub day_number: DayNumber,
    pub current_position: f64,
    pub reported_duration: f64,
}

impl ProgressReport {
    pub fn new(
        user_id: Uuid,
        video_id: impl Into<String>,
        day_number: DayNumber,
        current_position: f64,
        reported_duration: f64,
    ) -> ProgramResult<Self> {
        let video_id = video_id.into();
        if video_id.trim().is_empty() {
            return Err(ProgramError::Validation("videoId is required".to_string()));
        }
        if !current_position.is_finite() || current_position < 0.0 {
            return Err(ProgramError::Validation(format!(
                "currentPosition must be a non-negative number, got {current_position}"
            )));
        }
        if !reported_duration.is_finite() || reported_duration <= 0.0 {
            return Err(ProgramError::Validation(format!(
                "videoDuration must be a positive number, got {reported_duration}"
            )));
        }
        Ok(Self {
            user_id,
            video_id,
            day_number,
            current_position,
            reported_duration,
        })
    }

    pub fn key(&self) -> WatchKey {
        WatchKey {
            user_id: self.user_id,
            day_number: self.day_number,
            video_id: self.video_id.clone(),
        }
    }
}

//=========================================================================================
// Pure Update Algorithm
//=========================================================================================

/// Picks the authoritative duration. Players often report a slightly longer, more
/// precise duration once buffered, so only a clearly larger value replaces the stored one.
pub fn reconcile_duration(stored: f64, reported: f64) -> f64 {
    if stored <= 0.0 || reported - stored > DURATION_TOLERANCE_SECS {
        reported
    } else {
        stored
    }
}

/// Folds `report` into `previous` and returns the resulting record.
///
/// The returned record keeps the previous `version` and `updated_at`; the caller bumps
/// them only when the record actually changed. A brand new record starts at version 1.
pub fn apply_progress(
    previous: Option<&WatchRecord>,
    report: &ProgressReport,
    now: DateTime<Utc>,
) -> WatchRecord {
    let position = report.current_position;

    let (video_duration, max_watched_position, has_skipped_forward, was_completed) =
        match previous {
            None => (report.reported_duration, position, false, false),
            Some(prev) => {
                let duration = reconcile_duration(prev.video_duration, report.reported_duration);
                let max_position = prev.max_watched_position.max(position);

                // No baseline on a first report, so skip detection only runs here.
                let jumped = position - prev.last_position > SKIP_THRESHOLD_SECS;
                let rewound = position < REWIND_RESET_SECS && prev.has_skipped_forward;
                let skipped = if rewound {
                    false
                } else {
                    prev.has_skipped_forward || jumped
                };

                (duration, max_position, skipped, prev.is_completed)
            }
        };

    let watch_progress = (max_watched_position * 100.0 / video_duration).min(100.0);
    let near_end = video_duration - max_watched_position <= NEAR_END_TOLERANCE_SECS;
    let completed_now =
        watch_progress >= COMPLETION_THRESHOLD_PERCENT && (!has_skipped_forward || near_end);
    let is_completed = was_completed || completed_now;

    let completed_at = match previous.and_then(|p| p.completed_at) {
        Some(at) => Some(at),
        None if is_completed => Some(now),
        None => None,
    };

    WatchRecord {
        user_id: report.user_id,
        day_number: report.day_number,
        video_id: report.video_id.clone(),
        watch_progress,
        is_completed,
        watched_duration: max_watched_position,
        last_position: position,
        max_watched_position,
        video_duration,
        has_skipped_forward,
        completed_at,
        created_at: previous.map_or(now, |p| p.created_at),
        updated_at: previous.map_or(now, |p| p.updated_at),
        version: previous.map_or(1, |p| p.version),
    }
}

//=========================================================================================
// Engine Operations
//=========================================================================================

impl ProgramEngine {
    /// Applies a progress report and persists the result atomically for its key.
    pub async fn track_progress(&self, report: ProgressReport) -> ProgramResult<WatchRecord> {
        let video = self
            .catalog
            .get_video(&report.video_id)
            .await?
            .ok_or_else(|| ProgramError::NotFound {
                entity: "Video",
                id: report.video_id.clone(),
            })?;

        let key = report.key();
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let previous = self.watches.get_watch_record(&key).await?;
            let now = record_timestamp();
            let mut next = apply_progress(previous.as_ref(), &report, now);

            let saved = match &previous {
                None => self.watches.insert_watch_record(&next).await?,
                Some(prev) if *prev == next => true,
                Some(prev) => {
                    next.version = prev.version + 1;
                    next.updated_at = now;
                    self.watches.replace_watch_record(&next, prev.version).await?
                }
            };

            if !saved {
                debug!(
                    user_id = %key.user_id,
                    day = %key.day_number,
                    video_id = %key.video_id,
                    attempt,
                    "Watch record changed concurrently, retrying"
                );
                continue;
            }

            if next.is_completed && !previous.as_ref().is_some_and(|p| p.is_completed) {
                info!(
                    user_id = %key.user_id,
                    day = %key.day_number,
                    video_id = %key.video_id,
                    "Video completed"
                );
            }

            self.sync_catalog_duration(&video, next.video_duration).await;
            return Ok(next);
        }

        warn!(
            user_id = %key.user_id,
            video_id = %key.video_id,
            "Gave up saving watch record after {MAX_SAVE_ATTEMPTS} attempts"
        );
        Err(ProgramError::Internal(format!(
            "could not save watch progress for video {} after {MAX_SAVE_ATTEMPTS} attempts",
            key.video_id
        )))
    }

    /// The stored record for one video, or the first record of the day without a video id.
    pub async fn watch_status(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
        video_id: Option<&str>,
    ) -> ProgramResult<Option<WatchRecord>> {
        match video_id {
            Some(video_id) => {
                let key = WatchKey {
                    user_id,
                    day_number,
                    video_id: video_id.to_string(),
                };
                Ok(self.watches.get_watch_record(&key).await?)
            }
            None => Ok(self
                .watches
                .list_watch_records_for_day(user_id, day_number)
                .await?
                .into_iter()
                .next()),
        }
    }

    /// Writes the reconciled duration back to the catalog when it has none cached.
    /// Fills in a missing catalog duration. Runs after the watch record is saved, so a
    /// failure is logged and the saved record is still returned.
    async fn sync_catalog_duration(&self, video: &Video, duration: f64) {
        if video.duration.is_some() {
            return;
        }
        debug!(video_id = %video.id, duration, "Caching video duration in catalog");
        if let Err(e) = self
            .catalog
            .update_cached_duration(&video.id, duration)
            .await
        {
            warn!(video_id = %video.id, error = %e, "Failed to cache video duration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(position: f64, duration: f64) -> ProgressReport {
        ProgressReport::new(
            Uuid::nil(),
            "intro",
            DayNumber::FIRST,
            position,
            duration,
        )
        .unwrap()
    }

    fn track(previous: Option<&WatchRecord>, position: f64, duration: f64) -> WatchRecord {
        apply_progress(previous, &report(position, duration), Utc::now())
    }

    #[test]
    fn record_timestamps_have_microsecond_precision() {
        let now = record_timestamp();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(now, now.trunc_subsecs(6));
    }

    #[test]
    fn rejects_invalid_reports() {
        let user = Uuid::nil();
        assert!(ProgressReport::new(user, "v", DayNumber::FIRST, -1.0, 10.0).is_err());
        assert!(ProgressReport::new(user, "v", DayNumber::FIRST, 1.0, 0.0).is_err());
        assert!(ProgressReport::new(user, "v", DayNumber::FIRST, f64::NAN, 10.0).is_err());
        assert!(ProgressReport::new(user, " ", DayNumber::FIRST, 1.0, 10.0).is_err());
    }

    #[test]
    fn first_report_seeds_the_record() {
        let record = track(None, 10.0, 100.0);
        assert_eq!(record.video_duration, 100.0);
        assert_eq!(record.max_watched_position, 10.0);
        assert_eq!(record.last_position, 10.0);
        assert_eq!(record.watch_progress, 10.0);
        assert!(!record.has_skipped_forward);
        assert!(!record.is_completed);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn forward_jump_sets_skip_flag() {
        let first = track(None, 10.0, 100.0);
        let second = track(Some(&first), 20.0, 100.0);
        assert!(second.has_skipped_forward);
        assert_eq!(second.watch_progress, 20.0);
        assert!(!second.is_completed);
    }

    #[test]
    fn small_steps_are_not_skips() {
        let first = track(None, 10.0, 100.0);
        let second = track(Some(&first), 15.0, 100.0);
        assert!(!second.has_skipped_forward);
    }

    #[test]
    fn rewinding_to_the_start_clears_skip_flag() {
        let first = track(None, 10.0, 100.0);
        let skipped = track(Some(&first), 20.0, 100.0);
        let rewound = track(Some(&skipped), 5.0, 100.0);
        assert!(!rewound.has_skipped_forward);
        assert_eq!(rewound.max_watched_position, 20.0);
        assert_eq!(rewound.last_position, 5.0);
    }

    #[test]
    fn skip_flag_survives_rewind_past_reset_window() {
        let first = track(None, 10.0, 100.0);
        let skipped = track(Some(&first), 40.0, 100.0);
        let rewound = track(Some(&skipped), 30.0, 100.0);
        assert!(rewound.has_skipped_forward);
    }

    #[test]
    fn first_report_near_end_completes() {
        let record = track(None, 96.0, 100.0);
        assert_eq!(record.watch_progress, 96.0);
        assert!(!record.has_skipped_forward);
        assert!(record.is_completed);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn skipped_video_completes_only_at_the_very_end() {
        let first = track(None, 1.0, 100.0);
        let skipped = track(Some(&first), 96.0, 100.0);
        assert!(skipped.has_skipped_forward);
        assert!(!skipped.is_completed);

        let end = track(Some(&skipped), 99.5, 100.0);
        assert!(end.has_skipped_forward);
        assert!(end.is_completed);
    }

    #[test]
    fn completion_is_sticky_and_stamped_once() {
        let done = track(None, 98.0, 100.0);
        let stamped = done.completed_at;
        let later = track(Some(&done), 2.0, 100.0);
        assert!(later.is_completed);
        assert_eq!(later.completed_at, stamped);
        assert_eq!(later.max_watched_position, 98.0);
    }

    #[test]
    fn identical_report_leaves_record_unchanged() {
        let first = track(None, 42.0, 100.0);
        let again = track(Some(&first), 42.0, 100.0);
        assert_eq!(first, again);
    }

    #[test]
    fn max_position_never_regresses() {
        let mut record = track(None, 0.0, 300.0);
        let mut highest = record.max_watched_position;
        for position in [3.0, 7.0, 2.0, 50.0, 49.0, 0.0, 120.0, 60.0] {
            record = track(Some(&record), position, 300.0);
            assert!(record.max_watched_position >= highest);
            highest = record.max_watched_position;
        }
        assert_eq!(highest, 120.0);
    }

    #[test]
    fn duration_reconciliation_prefers_clearly_longer_reports() {
        assert_eq!(reconcile_duration(100.0, 100.4), 100.0);
        assert_eq!(reconcile_duration(100.0, 101.0), 101.0);
        assert_eq!(reconcile_duration(100.0, 80.0), 100.0);
        assert_eq!(reconcile_duration(0.0, 80.0), 80.0);

        let first = track(None, 50.0, 100.0);
        let longer = track(Some(&first), 52.0, 200.0);
        assert_eq!(longer.video_duration, 200.0);
        assert_eq!(longer.watch_progress, 26.0);
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        let record = track(None, 130.0, 100.0);
        assert_eq!(record.watch_progress, 100.0);
        assert!(record.is_completed);
    }
}
