use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};

use crate::db::operations::user::{load_tier, ms_to_datetime};
use crate::db::{Database, DbError};
use crate::services::progress::{apply_progress_event, ProgressEvent, UserProgress};

async fn load_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<UserProgress, DbError> {
    let tier = load_tier(conn, user_id)
        .await?
        .ok_or_else(|| DbError::UserNotFound(user_id.to_string()))?;

    let row = sqlx::query(
        r#"SELECT "points", "streak", "lastActive" FROM "user_progress" WHERE "userId" = ?"#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let lessons: Vec<String> = sqlx::query_scalar(
        r#"SELECT "lessonId" FROM "completed_lessons" WHERE "userId" = ? ORDER BY "lessonId""#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    // A missing row is a first-ever activity, not an error.
    let mut progress = UserProgress {
        completed_lessons: lessons.into_iter().collect(),
        proficiency_tier: tier,
        ..Default::default()
    };

    if let Some(row) = row {
        let points: i64 = row.try_get("points")?;
        let streak: i64 = row.try_get("streak")?;
        let last_active: Option<i64> = row.try_get("lastActive")?;

        progress.points = u64::try_from(points).unwrap_or(0);
        progress.streak = u32::try_from(streak).unwrap_or(0);
        progress.last_active = last_active.and_then(ms_to_datetime);
    }

    Ok(progress)
}

async fn save_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    progress: &UserProgress,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let now_ms = now.timestamp_millis();

    sqlx::query(
        r#"
        INSERT INTO "user_progress" ("userId", "points", "streak", "lastActive")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("userId") DO UPDATE SET
            "points" = excluded."points",
            "streak" = excluded."streak",
            "lastActive" = excluded."lastActive"
        "#,
    )
    .bind(user_id)
    .bind(i64::try_from(progress.points).unwrap_or(i64::MAX))
    .bind(i64::from(progress.streak))
    .bind(progress.last_active.map(|ts| ts.timestamp_millis()))
    .execute(&mut *conn)
    .await?;

    for lesson_id in &progress.completed_lessons {
        sqlx::query(
            r#"
            INSERT INTO "completed_lessons" ("userId", "lessonId", "completedAt")
            VALUES (?, ?, ?)
            ON CONFLICT ("userId", "lessonId") DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(lesson_id.as_str())
        .bind(now_ms)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query(r#"UPDATE "users" SET "hindiLevel" = ?, "updatedAt" = ? WHERE "id" = ?"#)
        .bind(progress.proficiency_tier.as_str())
        .bind(now_ms)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn get_progress(db: &Database, user_id: &str) -> Result<UserProgress, DbError> {
    let mut conn = db.pool().acquire().await?;
    load_progress(&mut conn, user_id).await
}

async fn apply_and_save(
    conn: &mut SqliteConnection,
    user_id: &str,
    event: &ProgressEvent,
    now: DateTime<Utc>,
) -> Result<(UserProgress, UserProgress), DbError> {
    let current = load_progress(conn, user_id).await?;
    let next = apply_progress_event(&current, event, now)?;
    save_progress(conn, user_id, &next, now).await?;
    Ok((current, next))
}

async fn rollback(conn: &mut SqliteConnection) {
    if let Err(err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        tracing::warn!(error = %err, "progress rollback failed");
    }
}

/// Loads, applies and stores one progress event in a single transaction.
///
/// The transaction is opened with `BEGIN IMMEDIATE` so the write lock is held
/// before the read; concurrent updates queue on `busy_timeout` instead of
/// failing when a deferred reader tries to upgrade. A rejected event rolls
/// back without writing anything.
pub async fn record_progress_event(
    db: &Database,
    user_id: &str,
    event: &ProgressEvent,
    now: DateTime<Utc>,
) -> Result<UserProgress, DbError> {
    // Detached so a dropped request cannot return a connection mid-transaction.
    let db = db.clone();
    let user_id = user_id.to_string();
    let event = event.clone();
    tokio::spawn(async move { record_locked(&db, &user_id, &event, now).await })
        .await
        .map_err(|err| DbError::Task(err.to_string()))?
}

async fn record_locked(
    db: &Database,
    user_id: &str,
    event: &ProgressEvent,
    now: DateTime<Utc>,
) -> Result<UserProgress, DbError> {
    let mut conn = db.pool().acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    let (current, next) = match apply_and_save(&mut conn, user_id, event, now).await {
        Ok(pair) => pair,
        Err(err) => {
            rollback(&mut conn).await;
            return Err(err);
        }
    };

    if let Err(err) = sqlx::query("COMMIT").execute(&mut *conn).await {
        rollback(&mut conn).await;
        return Err(err.into());
    }

    if next.proficiency_tier != current.proficiency_tier {
        tracing::info!(
            user_id,
            from = current.proficiency_tier.as_str(),
            to = next.proficiency_tier.as_str(),
            points = next.points,
            "proficiency tier upgraded"
        );
    }
    tracing::debug!(user_id, points = next.points, streak = next.streak, "progress recorded");

    Ok(next)
}
