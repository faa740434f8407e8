//! crates/program_core/src/domain.rs
//!
//! Defines the pure, core data structures for the guided program.
//! These structs are independent of any database or serialization format.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ProgramError, ProgramResult};

/// Number of days in the program.
pub const PROGRAM_DAYS: u8 = 42;

/// Number of answers every daily questionnaire must contain.
pub const DAILY_ANSWER_COUNT: usize = 6;

//=========================================================================================
// Day Number
//=========================================================================================

/// A validated program day in `1..=PROGRAM_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayNumber(u8);

impl DayNumber {
    pub const FIRST: DayNumber = DayNumber(1);

    pub fn new(value: i64) -> ProgramResult<Self> {
        if (1..=i64::from(PROGRAM_DAYS)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ProgramError::Validation(format!(
                "dayNumber must be between 1 and {PROGRAM_DAYS}, got {value}"
            )))
        }
    }

    /// Accepts a JSON-style number, rejecting anything with a fractional part.
    pub fn from_f64(value: f64) -> ProgramResult<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(ProgramError::Validation(format!(
                "dayNumber must be an integer, got {value}"
            )));
        }
        Self::new(value as i64)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_first(self) -> bool {
        self.0 == 1
    }

    pub fn previous(self) -> Option<DayNumber> {
        (self.0 > 1).then(|| DayNumber(self.0 - 1))
    }

    /// Every day before this one, in ascending order.
    pub fn preceding(self) -> impl Iterator<Item = DayNumber> {
        (1..self.0).map(DayNumber)
    }
}

impl fmt::Display for DayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//=========================================================================================
// Watch Tracking
//=========================================================================================

/// Identifies a single watch record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub user_id: Uuid,
    pub day_number: DayNumber,
    pub video_id: String,
}

/// Playback progress of one user on one video for one program day.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchRecord {
    pub user_id: Uuid,
    pub day_number: DayNumber,
    pub video_id: String,
    /// Percentage (0-100) of the video genuinely reached.
    pub watch_progress: f64,
    /// Sticky: never reverts once set.
    pub is_completed: bool,
    pub watched_duration: f64,
    pub last_position: f64,
    /// Non-decreasing for the lifetime of the record.
    pub max_watched_position: f64,
    pub video_duration: f64,
    pub has_skipped_forward: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every persisted change.
    pub version: i64,
}

impl WatchRecord {
    pub fn key(&self) -> WatchKey {
        WatchKey {
            user_id: self.user_id,
            day_number: self.day_number,
            video_id: self.video_id.clone(),
        }
    }
}

//=========================================================================================
// Video Catalog
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Published,
    Draft,
}

/// A catalog entry as seen by this core. Read-only apart from the cached duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub status: VideoStatus,
    /// Duration in seconds, if the catalog has one cached.
    pub duration: Option<f64>,
}

impl Video {
    pub fn is_publishable(&self) -> bool {
        self.status == VideoStatus::Published
    }
}

//=========================================================================================
// Daily Sessions and Answers
//=========================================================================================

/// A submitted daily questionnaire.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day_number: DayNumber,
    pub answers: Vec<String>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// The payload used to insert a new daily session.
#[derive(Debug, Clone)]
pub struct NewDailySession {
    pub user_id: Uuid,
    pub day_number: DayNumber,
    pub answers: Vec<String>,
    pub feedback: Option<String>,
}

/// One onboarding-quiz answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerItem {
    pub question_id: i32,
    pub answer: String,
}

/// The ordered onboarding answers of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerProfile {
    pub user_id: Uuid,
    pub answers: Vec<AnswerItem>,
}

//=========================================================================================
// Gate and Overview Results
//=========================================================================================

/// Outcome of a day-access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAccess {
    pub can_proceed: bool,
    pub blocking_day: Option<DayNumber>,
}

impl DayAccess {
    pub fn open() -> Self {
        Self {
            can_proceed: true,
            blocking_day: None,
        }
    }

    pub fn blocked(day: DayNumber) -> Self {
        Self {
            can_proceed: false,
            blocking_day: Some(day),
        }
    }
}

/// One row of the per-day session overview.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOverview {
    pub day_number: DayNumber,
    pub video_completed: bool,
    pub can_submit: bool,
    pub answers: Vec<String>,
    pub feedback: Option<String>,
}
