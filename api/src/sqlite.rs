use std::str::FromStr;

use anyhow::Result;
use axum::extract::FromRef;
use serde::Deserialize;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::AppState;

static MIGRATOR: Migrator = sqlx::migrate!("./db/migrations");

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Owned handle to the connection pool. Opened once at startup and closed
/// explicitly on shutdown.
#[derive(Debug, Clone)]
pub struct Database(SqlitePool);

impl Database {
    pub async fn close(&self) {
        self.0.close().await;
        tracing::info!("Database pool closed");
    }
}

impl AsRef<SqlitePool> for Database {
    fn as_ref(&self) -> &SqlitePool {
        &self.0
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app: &AppState) -> Self {
        app.db.clone()
    }
}

/// Opens the pool, creating the database file when missing, and brings the
/// schema up to date. Existing tables and rows are never dropped.
pub async fn create_pool(settings: &Settings) -> Result<Database> {
    let connect_options = SqliteConnectOptions::from_str(&settings.url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new();
    if let Some(max_connections) = settings.max_connections {
        pool_options = pool_options.max_connections(max_connections);
    }
    let pool = pool_options.connect_with(connect_options).await?;
    tracing::info!("Connected to {}", settings.url);

    MIGRATOR.run(&pool).await?;
    tracing::info!("Database schema is up to date");

    Ok(Database(pool))
}
