use crate::auth::sign_token_for_user;
use crate::config::Config;
use crate::db::operations::{create_user, find_user_by_email};
use crate::db::Database;

const DEMO_NAME: &str = "Demo User";
const DEMO_EMAIL: &str = "user1@example.com";

/// Ensures the local demo account exists and logs a fresh bearer token for it.
///
/// There is no login surface, so this is how a development client gets a token.
pub async fn seed_demo_user(db: &Database, config: &Config) {
    let user = match find_user_by_email(db, DEMO_EMAIL).await {
        Ok(Some(user)) => {
            tracing::debug!(user_id = %user.id, "demo user already exists");
            user
        }
        Ok(None) => match create_user(db, DEMO_NAME, DEMO_EMAIL).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = DEMO_EMAIL, "seeded demo user");
                user
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to seed demo user");
                return;
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "failed to look up demo user");
            return;
        }
    };

    let Some(secret) = config.jwt_secret.as_deref() else {
        tracing::warn!("JWT_SECRET not set, no demo token issued");
        return;
    };

    match sign_token_for_user(&user.id, secret, config.token_ttl) {
        Ok((token, expires_at)) => {
            tracing::info!(
                user_id = %user.id,
                %expires_at,
                token = %token,
                "demo bearer token issued"
            );
        }
        Err(err) => tracing::warn!(error = %err, "failed to issue demo token"),
    }
}
