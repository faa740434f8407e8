//! crates/program_core/src/gate.rs
//!
//! The day-access gate.
//!
//! Conceptually each (user, day) moves `Locked -> Unlockable -> Submitted`. Passing
//! [`ProgramEngine::validate_day_access`] makes a day unlockable; inserting its unique
//! daily session submits it.

use std::collections::HashSet;

use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{AnswerProfile, DayAccess, DayNumber};
use crate::engine::ProgramEngine;
use crate::error::{ProgramError, ProgramResult};

impl ProgramEngine {
    /// Decides whether `user_id` may submit a new session for `day_number`.
    ///
    /// Rules, in order: day 1 is always open; a prior day that was submitted without
    /// finishing its videos blocks; the skip policy may open the day; otherwise every
    /// prior day's video requirement must be satisfied.
    pub async fn validate_day_access(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> ProgramResult<DayAccess> {
        if day_number.is_first() {
            return Ok(DayAccess::open());
        }

        let completion = self.prior_day_completion(user_id, day_number).await?;
        let submitted: HashSet<DayNumber> = self
            .sessions
            .list_sessions(user_id)
            .await?
            .into_iter()
            .map(|s| s.day_number)
            .collect();

        if let Some((day, _)) = completion
            .iter()
            .find(|(day, done)| submitted.contains(day) && !done)
        {
            debug!(%user_id, day = %day_number, blocking = %day, "Submitted day has unfinished videos");
            return Ok(DayAccess::blocked(*day));
        }

        let profile = self.profiles.get_answers(user_id).await?;
        if self.skip_policy.can_skip_to_day(profile.as_ref(), day_number) {
            debug!(%user_id, day = %day_number, "Skip policy granted access");
            return Ok(DayAccess::open());
        }

        Ok(match completion.iter().find(|(_, done)| !done) {
            Some((day, _)) => DayAccess::blocked(*day),
            None => DayAccess::open(),
        })
    }

    /// Whether the submit action should be offered for `day_number`.
    pub async fn calculate_can_submit(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
        session_already_exists: bool,
        profile: Option<&AnswerProfile>,
    ) -> ProgramResult<bool> {
        if session_already_exists || day_number.is_first() {
            return Ok(true);
        }
        if self.skip_policy.can_skip_to_day(profile, day_number) {
            return Ok(true);
        }
        match day_number.previous() {
            Some(previous) => self.is_day_video_complete(user_id, previous).await,
            None => Ok(true),
        }
    }

    /// Completion of every day before `day_number`, ascending. The per-day lookups run
    /// concurrently against a single catalog listing.
    async fn prior_day_completion(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
    ) -> ProgramResult<Vec<(DayNumber, bool)>> {
        let videos = self.catalog.list_publishable_videos().await?;
        if videos.is_empty() {
            return Ok(day_number.preceding().map(|day| (day, false)).collect());
        }

        let videos = &videos;
        try_join_all(day_number.preceding().map(|day| async move {
            let done = self.day_requirement_met(videos, user_id, day).await?;
            Ok::<_, ProgramError>((day, done))
        }))
        .await
    }
}
