use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{authenticate, extract_token, AuthError};
use crate::response::{json_error, AppError};
use crate::state::AppState;

/// Rejects the request unless it carries a valid signed token for an
/// existing user; on success the `AuthUser` is stored in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return AppError::from(AuthError::MissingToken).into_response();
    };

    let Some(db) = state.db() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
        .into_response();
    };

    let Some(secret) = state.config().jwt_secret.as_deref() else {
        tracing::warn!("JWT_SECRET not configured, rejecting authenticated request");
        return AppError::from(AuthError::MissingSecret).into_response();
    };

    match authenticate(db, secret, &token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "authentication failed");
            AppError::from(err).into_response()
        }
    }
}
