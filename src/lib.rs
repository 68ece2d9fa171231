pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::Database;
use crate::state::AppState;

/// Connects the database (when reachable) and builds the full HTTP stack.
pub async fn create_app(config: Config) -> axum::Router {
    let db = match Database::connect(&config.database_url).await {
        Ok(db) => Some(db),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized");
            None
        }
    };

    if let (Some(db), true) = (db.as_ref(), config.seed_demo_user) {
        seed::seed_demo_user(db, &config).await;
    }

    build_app(AppState::new(config, db))
}

pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
