pub mod migrate;
pub mod operations;

use std::str::FromStr;
use std::time::{Duration, Instant};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::migrate::MigrationError;
use crate::services::progress::ProgressError;

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("invalid database url: {0}")]
    InvalidUrl(#[source] sqlx::Error),
    #[error("failed to create database directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("email {0} is already registered")]
    EmailTaken(String),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("database task failed: {0}")]
    Task(String),
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    ///
    /// In-memory URLs pin a single long-lived connection; every new SQLite
    /// memory connection would otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, DbInitError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(DbInitError::InvalidUrl)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            let filename = options.clone().get_filename();
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(DbInitError::Connect)?;

        migrate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip latency of a trivial query.
    pub async fn ping(&self) -> Result<Duration, DbError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }
}
