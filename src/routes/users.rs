use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::{self, ProfileUpdate, UserRecord};
use crate::db::Database;
use crate::response::{ok, AppError};
use crate::services::progress::{ProficiencyTier, ProgressEvent, UserProgress};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    completed_lesson: Option<String>,
    points: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    completed_lessons: Vec<String>,
    points: u64,
    streak: u32,
    last_active: Option<String>,
    hindi_level: ProficiencyTier,
}

impl From<UserProgress> for ProgressResponse {
    fn from(progress: UserProgress) -> Self {
        Self {
            completed_lessons: progress.completed_lessons.into_iter().collect(),
            points: progress.points,
            streak: progress.streak,
            last_active: progress
                .last_active
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            hindi_level: progress.proficiency_tier,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(flatten)]
    user: UserRecord,
    progress: ProgressResponse,
}

pub(crate) fn require_db(state: &AppState) -> Result<&Database, AppError> {
    state.db().ok_or_else(|| {
        crate::response::json_error(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
    })
}

pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let db = require_db(&state)?;
    let progress = operations::get_progress(db, &user.id).await?;
    Ok(ok(ProgressResponse::from(progress)))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateProgressRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = parse_body(payload)?;
    let db = require_db(&state)?;

    let event = ProgressEvent {
        completed_lesson_id: body.completed_lesson,
        points_delta: body.points,
    };

    let progress = operations::record_progress_event(db, &user.id, &event, Utc::now()).await?;
    Ok(ok(ProgressResponse::from(progress)))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let db = require_db(&state)?;
    let record = operations::find_user(db, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let progress = operations::get_progress(db, &user.id).await?;

    Ok(ok(MeResponse {
        user: record,
        progress: progress.into(),
    }))
}

fn normalize_profile(body: UpdateProfileRequest) -> Result<ProfileUpdate, AppError> {
    let name = match body.name.map(|name| name.trim().to_string()) {
        Some(name) if name.is_empty() => return Err(AppError::validation("name must not be empty")),
        other => other,
    };

    let email = match body.email.map(|email| email.trim().to_ascii_lowercase()) {
        Some(email) if !is_plausible_email(&email) => {
            return Err(AppError::validation("email address is not valid"))
        }
        other => other,
    };

    Ok(ProfileUpdate { name, email })
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let update = normalize_profile(parse_body(payload)?)?;
    let db = require_db(&state)?;

    let record = operations::update_profile(db, &user.id, &update).await?;
    tracing::info!(user_id = %user.id, "profile updated");
    Ok(ok(record))
}
