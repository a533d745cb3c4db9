//! Postgres persistence layer: connection pooling, migrations, row models,
//! and repositories.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Embedded schema migrations, applied with [`run_migrations`].
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database settings loaded from the environment.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string (`DATABASE_URL`).
    pub url: String,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`, default 20).
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Load settings from the environment, reading a `.env` file if present.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);
        Ok(Self {
            url,
            max_connections,
        })
    }
}

/// Create a connection pool from the given settings.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Applying database migrations");
    MIGRATOR.run(pool).await
}
