mod health;
mod learning;
mod users;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/users/progress",
            get(users::get_progress)
                .put(users::update_progress)
                .fallback(fallback_handler),
        )
        .route("/api/users/me", get(users::me).fallback(fallback_handler))
        .route(
            "/api/users/profile",
            axum::routing::put(users::update_profile).fallback(fallback_handler),
        )
        .route("/api/lessons", get(learning::list_lessons).fallback(fallback_handler))
        .route(
            "/api/lessons/:lessonId",
            get(learning::get_lesson).fallback(fallback_handler),
        )
        .route(
            "/api/lessons/:lessonId/exercises/:exerciseId/answer",
            post(learning::answer_exercise).fallback(fallback_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/api/levels", get(learning::list_levels).fallback(fallback_handler))
        .route(
            "/api/levels/:levelId/attempt",
            post(learning::attempt_challenge).fallback(fallback_handler),
        )
        .route(
            "/api/pronunciation/score",
            post(learning::score).fallback(fallback_handler),
        );

    Router::new()
        .merge(protected)
        .merge(public)
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}
