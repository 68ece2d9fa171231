use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::operations;
use crate::response::{ok, AppError};
use crate::routes::users::{parse_body, require_db};
use crate::services::curriculum::{
    check_answer, evaluate_attempt, lesson_detail, lesson_statuses, LevelBoard, LESSON_CATALOG,
};
use crate::services::pronunciation::score_pronunciation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LevelsQuery {
    completed: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRequest {
    challenge_index: usize,
    transcript: String,
    #[serde(default)]
    completed_levels: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    transcript: String,
    expected: String,
}

fn parse_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

fn parse_level_ids(raw: &str) -> Result<Vec<u32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::validation(format!("invalid level id: {part}")))
        })
        .collect()
}

pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let db = require_db(&state)?;
    let progress = operations::get_progress(db, &user.id).await?;
    Ok(ok(lesson_statuses(LESSON_CATALOG, &progress.completed_lessons)))
}

pub async fn get_lesson(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let lesson_id = parse_path(path)?;
    let db = require_db(&state)?;
    let progress = operations::get_progress(db, &user.id).await?;
    Ok(ok(lesson_detail(LESSON_CATALOG, &lesson_id, &progress.completed_lessons)?))
}

pub async fn answer_exercise(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<(String, String)>, PathRejection>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (lesson_id, exercise_id) = parse_path(path)?;
    let body = parse_body(payload)?;
    let db = require_db(&state)?;
    let progress = operations::get_progress(db, &user.id).await?;

    let detail = lesson_detail(LESSON_CATALOG, &lesson_id, &progress.completed_lessons)?;
    let result = check_answer(&detail, &exercise_id, &body.answer)?;

    tracing::debug!(
        user_id = %user.id,
        lesson_id = %lesson_id,
        exercise_id = %exercise_id,
        correct = result.correct,
        "exercise answer checked"
    );

    Ok(ok(result))
}

pub async fn list_levels(
    query: Result<Query<LevelsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let query = parse_query(query)?;
    let completed = match query.completed.as_deref() {
        Some(raw) => parse_level_ids(raw)?,
        None => Vec::new(),
    };
    let board = LevelBoard::with_completed(completed);
    Ok(ok(board.levels().to_vec()))
}

pub async fn attempt_challenge(
    path: Result<Path<u32>, PathRejection>,
    payload: Result<Json<AttemptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let level_id = parse_path(path)?;
    let body = parse_body(payload)?;

    let board = LevelBoard::with_completed(body.completed_levels);
    let level = board.start(level_id)?;
    let result = evaluate_attempt(level, body.challenge_index, &body.transcript)?;

    tracing::debug!(
        level_id,
        challenge_index = body.challenge_index,
        score = result.score.score,
        accepted = result.score.accepted,
        "challenge attempt graded"
    );

    Ok(ok(result))
}

pub async fn score(
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = parse_body(payload)?;
    Ok(ok(score_pronunciation(&body.transcript, &body.expected)))
}
