//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ApiResult};
use crate::web::middleware::CurrentUser;
use crate::web::protocol::{
    AnswerItemPayload, AnswerProfileResponse, DailySessionResponse, DayAccessResponse,
    DayOverviewResponse, DayQuery, HealthResponse, SaveAnswersRequest, StatusQuery,
    SubmitSessionRequest, TrackProgressRequest, TrackProgressResponse, WatchRecordResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use program_core::{DayNumber, ProgramError, ProgressReport};
use std::sync::Arc;
use tracing::debug;
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        track_progress_handler,
        watch_status_handler,
        day_access_handler,
        submit_session_handler,
        list_sessions_handler,
        save_answers_handler,
    ),
    components(
        schemas(
            TrackProgressRequest,
            TrackProgressResponse,
            WatchRecordResponse,
            DayAccessResponse,
            SubmitSessionRequest,
            DailySessionResponse,
            DayOverviewResponse,
            SaveAnswersRequest,
            AnswerItemPayload,
            AnswerProfileResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Guided Program API", description = "Video watch tracking and day-access gating.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Boundary Validation Helpers
//=========================================================================================

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ProgramError::Validation(format!("{field} is required")).into())
}

fn required_day(value: Option<f64>) -> Result<DayNumber, ApiError> {
    Ok(DayNumber::from_f64(required(value, "dayNumber")?)?)
}

fn optional_day(value: Option<f64>) -> Result<Option<DayNumber>, ApiError> {
    Ok(value.map(DayNumber::from_f64).transpose()?)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Report playback progress for one video of one program day.
#[utoipa::path(
    put,
    path = "/track",
    request_body = TrackProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = TrackProgressResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "Missing x-user-id header"),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn track_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    payload: Result<Json<TrackProgressRequest>, JsonRejection>,
) -> ApiResult<Json<TrackProgressResponse>> {
    let body = json_body(payload)?;
    let video_id = required(body.video_id, "videoId")?;
    let day_number = required_day(body.day_number)?;
    let current_position = required(body.current_position, "currentPosition")?;
    let video_duration = required(body.video_duration, "videoDuration")?;
    let report = ProgressReport::new(
        user_id,
        video_id,
        day_number,
        current_position,
        video_duration,
    )?;

    let record = app_state.engine.track_progress(report).await?;
    debug!(%user_id, video_id = %record.video_id, progress = record.watch_progress, "Progress tracked");

    Ok(Json(TrackProgressResponse {
        record: record.into(),
        can_proceed: true,
    }))
}

/// The caller's watch record for a day, or `null` if nothing was reported yet.
#[utoipa::path(
    get,
    path = "/status",
    params(
        StatusQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Watch record, or null if none exists", body = WatchRecordResponse),
        (status = 400, description = "Missing or invalid dayNumber")
    )
)]
pub async fn watch_status_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<Json<Option<WatchRecordResponse>>> {
    let params = query_params(query)?;
    let day_number = required_day(params.day_number)?;
    let record = app_state
        .engine
        .watch_status(user_id, day_number, params.video_id.as_deref())
        .await?;
    Ok(Json(record.map(Into::into)))
}

/// Whether the caller may submit a new session for a day.
#[utoipa::path(
    get,
    path = "/access",
    params(
        DayQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Gate decision", body = DayAccessResponse),
        (status = 400, description = "Missing or invalid dayNumber")
    )
)]
pub async fn day_access_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> ApiResult<Json<DayAccessResponse>> {
    let params = query_params(query)?;
    let day_number = required_day(params.day_number)?;
    let access = app_state
        .engine
        .validate_day_access(user_id, day_number)
        .await?;
    Ok(Json(access.into()))
}

/// Submit the daily questionnaire. Rejected with 403 while an earlier day's videos
/// are unfinished.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = SubmitSessionRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 201, description = "Session submitted", body = DailySessionResponse),
        (status = 400, description = "Invalid answers or dayNumber"),
        (status = 403, description = "An earlier day's video is not completed"),
        (status = 409, description = "Session already submitted for this day")
    )
)]
pub async fn submit_session_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    payload: Result<Json<SubmitSessionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(payload)?;
    let day_number = required_day(body.day_number)?;
    let session = app_state
        .engine
        .submit_daily_session(user_id, day_number, body.answers, body.feedback)
        .await?;
    Ok((StatusCode::CREATED, Json(DailySessionResponse::from(session))))
}

/// The caller's submitted days with their flags, optionally probing one more day.
#[utoipa::path(
    get,
    path = "/sessions",
    params(
        DayQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Per-day overview, ascending", body = [DayOverviewResponse])
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<DayOverviewResponse>>> {
    let params = query_params(query)?;
    let probe_day = optional_day(params.day_number)?;
    let overview = app_state
        .engine
        .session_overview(user_id, probe_day)
        .await?;
    Ok(Json(overview.into_iter().map(Into::into).collect()))
}

/// Store the caller's onboarding answers, replacing any previous set.
#[utoipa::path(
    put,
    path = "/profile/answers",
    request_body = SaveAnswersRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Answers stored", body = AnswerProfileResponse),
        (status = 400, description = "Malformed body")
    )
)]
pub async fn save_answers_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    payload: Result<Json<SaveAnswersRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerProfileResponse>> {
    let body = json_body(payload)?;
    let answers = body.answers.into_iter().map(Into::into).collect();
    let profile = app_state
        .engine
        .profiles()
        .save_answers(user_id, answers)
        .await?;
    Ok(Json(profile.into()))
}
