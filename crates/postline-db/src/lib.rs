use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use thiserror::Error;

use postline_core::AppConfig;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/postline-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("scheduled post {id} is not in '{expected_status}' status")]
    InvalidScheduleTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` from env.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if `DATABASE_URL` is unset, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    connect_pool(&database_url, PoolConfig::default())
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }
}

pub mod launch_phases;
pub mod launches;
pub mod media_kit;
pub mod posts;
pub mod products;
pub mod profiles;
pub mod protocols;
pub mod scheduled_posts;

pub use launch_phases::{
    create_launch_phase, delete_launch_phase, get_launch_phase, list_launch_phases,
    update_launch_phase, LaunchPhasePatch, LaunchPhaseRow, NewLaunchPhase,
};
pub use launches::{
    create_launch, delete_launch, get_launch, list_launches, update_launch, LaunchPatch, LaunchRow,
    NewLaunch,
};
pub use media_kit::{
    create_media_kit_resource, delete_media_kit_resource, get_media_kit_resource,
    list_media_kit_resources, update_media_kit_resource, MediaKitResourcePatch,
    MediaKitResourceRow, NewMediaKitResource,
};
pub use posts::{
    create_post, delete_post, get_post, list_posts, update_post, NewPost, PostListFilters,
    PostPatch, PostRow,
};
pub use products::{
    create_product, delete_product, get_product, list_products, update_product, NewProduct,
    ProductPatch, ProductRow,
};
pub use profiles::{
    create_profile, delete_profile, get_profile, list_profiles, update_profile,
    update_profile_metrics, MetricsPatch, NewProfile, ProfilePatch, ProfileRow,
};
pub use protocols::{
    create_protocol, delete_protocol, get_protocol, list_protocols, update_protocol, NewProtocol,
    ProtocolPatch, ProtocolRow,
};
pub use scheduled_posts::{
    create_scheduled_post, delete_scheduled_post, get_scheduled_post, list_due_scheduled_posts,
    list_scheduled_posts, mark_scheduled_post_failed, mark_scheduled_post_sent, NewScheduledPost,
    ScheduledPostFilters, ScheduledPostRow,
};
