use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use shabd_backend::db::operations::{create_user, get_progress, record_progress_event};
use shabd_backend::db::{Database, DbError};
use shabd_backend::services::progress::{ProficiencyTier, ProgressEvent};

fn file_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("nested/shabd.db").display())
}

#[tokio::test]
async fn test_progress_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let day_one = Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap();

    let user_id = {
        let db = Database::connect(&file_url(&dir)).await.unwrap();
        let user = create_user(&db, "Ravi", "ravi@example.com").await.unwrap();
        record_progress_event(
            &db,
            &user.id,
            &ProgressEvent {
                completed_lesson_id: Some("vowels-1".to_string()),
                points_delta: Some(990),
            },
            day_one,
        )
        .await
        .unwrap();
        db.pool().close().await;
        user.id
    };

    let db = Database::connect(&file_url(&dir)).await.unwrap();
    let restored = get_progress(&db, &user_id).await.unwrap();
    assert_eq!(restored.points, 990);
    assert_eq!(restored.streak, 1);
    assert_eq!(restored.last_active, Some(day_one));
    assert!(restored.completed_lessons.contains("vowels-1"));

    let day_two = day_one + Duration::days(1);
    let next = record_progress_event(&db, &user_id, &ProgressEvent::points(20), day_two)
        .await
        .unwrap();
    assert_eq!(next.streak, 2);
    assert_eq!(next.proficiency_tier, ProficiencyTier::Intermediate);

    let stored = get_progress(&db, &user_id).await.unwrap();
    assert_eq!(stored.proficiency_tier, ProficiencyTier::Intermediate);
}

#[tokio::test]
async fn test_unknown_user_progress() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let err = get_progress(&db, "missing").await.unwrap_err();
    assert!(matches!(err, DbError::UserNotFound(_)));
}

#[tokio::test]
async fn test_rejected_event_leaves_store_untouched() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let user = create_user(&db, "Meera", "meera@example.com").await.unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    let err = record_progress_event(
        &db,
        &user.id,
        &ProgressEvent {
            completed_lesson_id: Some("vowels-1".to_string()),
            points_delta: Some(-1),
        },
        now,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::Progress(_)));

    let stored = get_progress(&db, &user.id).await.unwrap();
    assert_eq!(stored.points, 0);
    assert_eq!(stored.streak, 0);
    assert!(stored.last_active.is_none());
    assert!(stored.completed_lessons.is_empty());

    // the rolled-back connection is reusable
    let next = record_progress_event(&db, &user.id, &ProgressEvent::points(5), now)
        .await
        .unwrap();
    assert_eq!(next.points, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_serialize() {
    let dir = TempDir::new().unwrap();
    let db = Database::connect(&file_url(&dir)).await.unwrap();
    let user = create_user(&db, "Asha", "asha@example.com").await.unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let db = db.clone();
            let user_id = user.id.clone();
            tokio::spawn(async move {
                record_progress_event(&db, &user_id, &ProgressEvent::points(10), now).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = get_progress(&db, &user.id).await.unwrap();
    assert_eq!(stored.points, 200);
    assert_eq!(stored.streak, 1);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    create_user(&db, "A", "same@example.com").await.unwrap();
    let err = create_user(&db, "B", "same@example.com").await.unwrap_err();
    assert!(matches!(err, DbError::EmailTaken(_)));
}
