use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::db::{Database, DbError};
use crate::services::progress::ProficiencyTier;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub hindi_level: ProficiencyTier,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub(crate) fn format_ms_iso(value: i64) -> String {
    Utc.timestamp_millis_opt(value)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

pub(crate) fn ms_to_datetime(value: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value).single()
}

fn map_user_row(row: &SqliteRow) -> Result<UserRecord, sqlx::Error> {
    let hindi_level: String = row.try_get("hindiLevel")?;
    let created_at: i64 = row.try_get("createdAt")?;
    let updated_at: i64 = row.try_get("updatedAt")?;

    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        hindi_level: ProficiencyTier::parse(&hindi_level).unwrap_or_default(),
        created_at: format_ms_iso(created_at),
        updated_at: format_ms_iso(updated_at),
    })
}

fn map_unique_violation(err: sqlx::Error, email: &str) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::EmailTaken(email.to_string())
        }
        _ => DbError::Sqlx(err),
    }
}

pub async fn create_user(db: &Database, name: &str, email: &str) -> Result<UserRecord, DbError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp_millis();

    let mut tx = db.pool().begin().await?;

    sqlx::query(
        r#"
        INSERT INTO "users" ("id", "name", "email", "hindiLevel", "createdAt", "updatedAt")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(ProficiencyTier::Beginner.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| map_unique_violation(err, email))?;

    sqlx::query(r#"INSERT INTO "user_progress" ("userId", "points", "streak") VALUES (?, 0, 0)"#)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %id, "user created");
    find_user(db, &id)
        .await?
        .ok_or_else(|| DbError::UserNotFound(id.clone()))
}

pub async fn find_user(db: &Database, user_id: &str) -> Result<Option<UserRecord>, DbError> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "id" = ?"#)
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;

    Ok(row.as_ref().map(map_user_row).transpose()?)
}

pub async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<UserRecord>, DbError> {
    let row = sqlx::query(r#"SELECT * FROM "users" WHERE "email" = ?"#)
        .bind(email)
        .fetch_optional(db.pool())
        .await?;

    Ok(row.as_ref().map(map_user_row).transpose()?)
}

pub async fn update_profile(
    db: &Database,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<UserRecord, DbError> {
    let result = sqlx::query(
        r#"
        UPDATE "users"
        SET "name" = COALESCE(?, "name"),
            "email" = COALESCE(?, "email"),
            "updatedAt" = ?
        WHERE "id" = ?
        "#,
    )
    .bind(update.name.as_deref())
    .bind(update.email.as_deref())
    .bind(Utc::now().timestamp_millis())
    .bind(user_id)
    .execute(db.pool())
    .await
    .map_err(|err| map_unique_violation(err, update.email.as_deref().unwrap_or_default()))?;

    if result.rows_affected() == 0 {
        return Err(DbError::UserNotFound(user_id.to_string()));
    }

    find_user(db, user_id)
        .await?
        .ok_or_else(|| DbError::UserNotFound(user_id.to_string()))
}

pub(crate) async fn load_tier(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<ProficiencyTier>, DbError> {
    let level: Option<String> =
        sqlx::query_scalar(r#"SELECT "hindiLevel" FROM "users" WHERE "id" = ?"#)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(level.map(|value| ProficiencyTier::parse(&value).unwrap_or_default()))
}
