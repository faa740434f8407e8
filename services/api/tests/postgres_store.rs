//! Tests for the Postgres adapter. They run only when `DATABASE_URL` points at a
//! database the migrations can be applied to.

mod common;

use common::{day, db_engine, postgres_adapter, seed_draft_video, six_answers};
use program_core::{
    AnswerItem, AnswerProfileStore, NewDailySession, PortError, ProgramError, ProgressReport,
    SessionStore, VideoCatalog, WatchStore,
};
use uuid::Uuid;

fn report(user: Uuid, video_id: &str, position: f64, duration: f64) -> ProgressReport {
    ProgressReport::new(user, video_id, day(1), position, duration).unwrap()
}

// ---------------------------------------------------------------------------
// Watch records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn longer_duration_lowers_stored_progress() {
    let Some((pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let engine = db_engine(&adapter);
    let video_id = seed_draft_video(&pool, Some(100.0)).await;
    let user = Uuid::new_v4();

    engine.track_progress(report(user, &video_id, 50.0, 100.0)).await.unwrap();
    let grown = engine
        .track_progress(report(user, &video_id, 52.0, 200.0))
        .await
        .unwrap();
    assert_eq!(grown.video_duration, 200.0);
    assert_eq!(grown.watch_progress, 26.0);

    let stored = adapter.get_watch_record(&grown.key()).await.unwrap().unwrap();
    assert_eq!(stored, grown);

    let again = engine
        .track_progress(report(user, &video_id, 52.0, 200.0))
        .await
        .unwrap();
    assert_eq!(again, grown);
    assert_eq!(again.version, 2);
}

#[tokio::test]
async fn identical_reports_return_identical_records() {
    let Some((pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let engine = db_engine(&adapter);
    let video_id = seed_draft_video(&pool, Some(100.0)).await;
    let user = Uuid::new_v4();

    engine.track_progress(report(user, &video_id, 10.0, 100.0)).await.unwrap();
    let first = engine
        .track_progress(report(user, &video_id, 14.0, 100.0))
        .await
        .unwrap();
    let second = engine
        .track_progress(report(user, &video_id, 14.0, 100.0))
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn insert_and_replace_respect_existing_rows() {
    let Some((pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let engine = db_engine(&adapter);
    let video_id = seed_draft_video(&pool, Some(100.0)).await;
    let user = Uuid::new_v4();

    let record = engine
        .track_progress(report(user, &video_id, 10.0, 100.0))
        .await
        .unwrap();
    assert!(!adapter.insert_watch_record(&record).await.unwrap());

    let mut stale = record.clone();
    stale.last_position = 12.0;
    stale.version = record.version + 1;
    assert!(adapter.replace_watch_record(&stale, record.version).await.unwrap());
    assert!(!adapter.replace_watch_record(&stale, record.version).await.unwrap());
}

#[tokio::test]
async fn missing_duration_is_cached_in_the_catalog() {
    let Some((pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let engine = db_engine(&adapter);
    let video_id = seed_draft_video(&pool, None).await;

    engine
        .track_progress(report(Uuid::new_v4(), &video_id, 1.0, 180.0))
        .await
        .unwrap();
    let video = adapter.get_video(&video_id).await.unwrap().unwrap();
    assert_eq!(video.duration, Some(180.0));
}

// ---------------------------------------------------------------------------
// Sessions and answers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_session_insert_is_a_conflict() {
    let Some((_pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let user = Uuid::new_v4();
    let session = NewDailySession {
        user_id: user,
        day_number: day(1),
        answers: six_answers(),
        feedback: None,
    };

    let created = adapter.create_session(session.clone()).await.unwrap();
    assert_eq!(created.answers, six_answers());
    let err = adapter.create_session(session).await.unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));

    let err = db_engine(&adapter)
        .submit_daily_session(user, day(1), six_answers(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgramError::Conflict(_)));
}

#[tokio::test]
async fn saved_answers_replace_the_previous_profile() {
    let Some((_pool, adapter)) = postgres_adapter().await else {
        return;
    };
    let user = Uuid::new_v4();
    assert!(adapter.get_answers(user).await.unwrap().is_none());

    let item = |question_id, answer: &str| AnswerItem {
        question_id,
        answer: answer.to_string(),
    };
    adapter
        .save_answers(user, vec![item(1, "mild"), item(2, "often")])
        .await
        .unwrap();
    adapter.save_answers(user, vec![item(3, "severe")]).await.unwrap();

    let profile = adapter.get_answers(user).await.unwrap().unwrap();
    assert_eq!(profile.answers, vec![item(3, "severe")]);
}
