//! crates/program_core/src/sessions.rs
//!
//! Daily session submission and the per-day session overview.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    AnswerProfile, DailySession, DayNumber, DayOverview, NewDailySession, DAILY_ANSWER_COUNT,
};
use crate::engine::ProgramEngine;
use crate::error::{ProgramError, ProgramResult};
use crate::ports::PortError;

pub const MAX_FEEDBACK_CHARS: usize = 2000;

/// Checks the shape of a questionnaire submission before anything is read or written.
pub fn validate_submission(answers: &[String], feedback: Option<&str>) -> ProgramResult<()> {
    if answers.len() != DAILY_ANSWER_COUNT {
        return Err(ProgramError::Validation(format!(
            "exactly {DAILY_ANSWER_COUNT} answers are required, got {}",
            answers.len()
        )));
    }
    if let Some(index) = answers.iter().position(|a| a.trim().is_empty()) {
        return Err(ProgramError::Validation(format!(
            "answer {} must not be empty",
            index + 1
        )));
    }
    if feedback.is_some_and(|f| f.chars().count() > MAX_FEEDBACK_CHARS) {
        return Err(ProgramError::Validation(format!(
            "feedback must be at most {MAX_FEEDBACK_CHARS} characters"
        )));
    }
    Ok(())
}

impl ProgramEngine {
    /// Submits the questionnaire for one day, after the day-access gate agrees.
    pub async fn submit_daily_session(
        &self,
        user_id: Uuid,
        day_number: DayNumber,
        answers: Vec<String>,
        feedback: Option<String>,
    ) -> ProgramResult<DailySession> {
        let feedback = feedback.filter(|f| !f.trim().is_empty());
        validate_submission(&answers, feedback.as_deref())?;

        if self.sessions.find_session(user_id, day_number).await?.is_some() {
            return Err(already_submitted(day_number));
        }

        let access = self.validate_day_access(user_id, day_number).await?;
        if let Some(blocking_day) = access.blocking_day.filter(|_| !access.can_proceed) {
            warn!(%user_id, day = %day_number, blocking = %blocking_day, "Session submission blocked");
            return Err(ProgramError::AccessDenied { blocking_day });
        }

        let session = self
            .sessions
            .create_session(NewDailySession {
                user_id,
                day_number,
                answers,
                feedback,
            })
            .await
            .map_err(|e| match e {
                PortError::Conflict(_) => already_submitted(day_number),
                other => other.into(),
            })?;

        info!(%user_id, day = %day_number, session_id = %session.id, "Daily session submitted");
        Ok(session)
    }

    /// Loads the user's sessions and shapes them into the per-day overview,
    /// optionally probing a day that has not been submitted yet.
    pub async fn session_overview(
        &self,
        user_id: Uuid,
        probe_day: Option<DayNumber>,
    ) -> ProgramResult<Vec<DayOverview>> {
        let sessions = self.sessions.list_sessions(user_id).await?;
        let profile = self.profiles.get_answers(user_id).await?;
        self.build_overview(user_id, sessions, profile.as_ref(), probe_day)
            .await
    }

    /// Groups `sessions` by day and computes each day's flags independently.
    /// The result is sorted ascending by day.
    pub async fn build_overview(
        &self,
        user_id: Uuid,
        sessions: Vec<DailySession>,
        profile: Option<&AnswerProfile>,
        probe_day: Option<DayNumber>,
    ) -> ProgramResult<Vec<DayOverview>> {
        let mut by_day: BTreeMap<DayNumber, Vec<DailySession>> = BTreeMap::new();
        for session in sessions {
            by_day.entry(session.day_number).or_default().push(session);
        }
        if let Some(day) = probe_day {
            by_day.entry(day).or_default();
        }

        try_join_all(by_day.into_iter().map(|(day_number, group)| async move {
            let submitted = !group.is_empty();
            let video_completed = self.is_day_video_complete(user_id, day_number).await?;
            let can_submit = self
                .calculate_can_submit(user_id, day_number, submitted, profile)
                .await?;
            let feedback = group.iter().find_map(|s| s.feedback.clone());
            let answers = group.into_iter().flat_map(|s| s.answers).collect();
            Ok::<_, ProgramError>(DayOverview {
                day_number,
                video_completed,
                can_submit,
                answers,
                feedback,
            })
        }))
        .await
    }
}

fn already_submitted(day_number: DayNumber) -> ProgramError {
    ProgramError::Conflict(format!("session for day {day_number} was already submitted"))
}
