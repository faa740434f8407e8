//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between clients and the REST API.
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use program_core::domain::{
    AnswerItem, AnswerProfile, DailySession, DayAccess, DayOverview, WatchRecord,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Payloads Sent FROM the Client TO the Server
//=========================================================================================
// NOTE: numeric fields are optional here so that missing values surface as a 400
// validation error rather than a generic body rejection.
//=========================================================================================

/// A playback progress report.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackProgressRequest {
    pub video_id: Option<String>,
    /// Integer between 1 and 42.
    pub day_number: Option<f64>,
    /// Seconds from the start of the video.
    pub current_position: Option<f64>,
    /// Duration in seconds as reported by the player.
    pub video_duration: Option<f64>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub day_number: Option<f64>,
    pub video_id: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    pub day_number: Option<f64>,
}

/// A daily questionnaire submission.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSessionRequest {
    pub day_number: Option<f64>,
    #[serde(default)]
    pub answers: Vec<String>,
    pub feedback: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerItemPayload {
    pub question_id: i32,
    pub answer: String,
}

/// The onboarding answers of the caller, in order.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswersRequest {
    pub answers: Vec<AnswerItemPayload>,
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecordResponse {
    pub video_id: String,
    pub day_number: u8,
    pub watch_progress: f64,
    pub is_completed: bool,
    pub watched_duration: f64,
    pub last_position: f64,
    pub max_watched_position: f64,
    pub video_duration: f64,
    pub has_skipped_forward: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WatchRecord> for WatchRecordResponse {
    fn from(r: WatchRecord) -> Self {
        Self {
            video_id: r.video_id,
            day_number: r.day_number.get(),
            watch_progress: r.watch_progress,
            is_completed: r.is_completed,
            watched_duration: r.watched_duration,
            last_position: r.last_position,
            max_watched_position: r.max_watched_position,
            video_duration: r.video_duration,
            has_skipped_forward: r.has_skipped_forward,
            completed_at: r.completed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// The updated record plus the proceed flag the player uses to keep reporting.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackProgressResponse {
    #[serde(flatten)]
    pub record: WatchRecordResponse,
    pub can_proceed: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayAccessResponse {
    pub can_proceed: bool,
    pub blocking_day: Option<u8>,
}

impl From<DayAccess> for DayAccessResponse {
    fn from(access: DayAccess) -> Self {
        Self {
            can_proceed: access.can_proceed,
            blocking_day: access.blocking_day.map(|d| d.get()),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySessionResponse {
    pub id: Uuid,
    pub day_number: u8,
    pub answers: Vec<String>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<DailySession> for DailySessionResponse {
    fn from(s: DailySession) -> Self {
        Self {
            id: s.id,
            day_number: s.day_number.get(),
            answers: s.answers,
            feedback: s.feedback,
            submitted_at: s.submitted_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayOverviewResponse {
    pub day_number: u8,
    pub video_completed: bool,
    pub can_submit: bool,
    pub answers: Vec<String>,
    pub feedback: Option<String>,
}

impl From<DayOverview> for DayOverviewResponse {
    fn from(d: DayOverview) -> Self {
        Self {
            day_number: d.day_number.get(),
            video_completed: d.video_completed,
            can_submit: d.can_submit,
            answers: d.answers,
            feedback: d.feedback,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerProfileResponse {
    pub user_id: Uuid,
    pub answers: Vec<AnswerItemPayload>,
}

impl From<AnswerProfile> for AnswerProfileResponse {
    fn from(p: AnswerProfile) -> Self {
        Self {
            user_id: p.user_id,
            answers: p
                .answers
                .into_iter()
                .map(|a| AnswerItemPayload {
                    question_id: a.question_id,
                    answer: a.answer,
                })
                .collect(),
        }
    }
}

impl From<AnswerItemPayload> for AnswerItem {
    fn from(p: AnswerItemPayload) -> Self {
        Self {
            question_id: p.question_id,
            answer: p.answer,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
