//! Database operations for the `social_profiles` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use postline_core::Platform;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `social_profiles` table.
///
/// `platform` is stored as its canonical string; parse with
/// [`Platform::from`] when platform semantics are needed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub display_name: String,
    pub handle: String,
    pub platform: String,
    pub is_active: bool,
    pub follower_count: Option<i64>,
    pub growth_rate: Option<Decimal>,
    pub engagement_rate: Option<Decimal>,
    pub notes: Option<String>,
    /// Added in the metrics migration (20260301000100).
    pub metrics_refreshed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub display_name: String,
    pub handle: String,
    pub platform: Platform,
    pub notes: Option<String>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub platform: Option<Platform>,
    pub is_active: Option<bool>,
    pub notes: Option<Option<String>>,
}

/// A metrics sample to apply to a profile.
#[derive(Debug, Clone, Copy)]
pub struct MetricsPatch {
    pub follower_count: i64,
    pub growth_rate: Decimal,
    pub engagement_rate: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns profiles ordered by display name. With `only_active`, inactive
/// profiles are excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_profiles(pool: &PgPool, only_active: bool) -> Result<Vec<ProfileRow>, DbError> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, display_name, handle, platform, is_active, follower_count, \
                growth_rate, engagement_rate, notes, metrics_refreshed_at, created_at, updated_at \
         FROM social_profiles \
         WHERE ($1 = false OR is_active = true) \
         ORDER BY display_name, id",
    )
    .bind(only_active)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single profile by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile(pool: &PgPool, id: i64) -> Result<Option<ProfileRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, display_name, handle, platform, is_active, follower_count, \
                growth_rate, engagement_rate, notes, metrics_refreshed_at, created_at, updated_at \
         FROM social_profiles \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a profile and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including the unique
/// `(platform, handle)` constraint).
pub async fn create_profile(pool: &PgPool, profile: &NewProfile) -> Result<ProfileRow, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "INSERT INTO social_profiles (display_name, handle, platform, notes) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, display_name, handle, platform, is_active, follower_count, \
                   growth_rate, engagement_rate, notes, metrics_refreshed_at, created_at, updated_at",
    )
    .bind(&profile.display_name)
    .bind(&profile.handle)
    .bind(profile.platform.as_str())
    .bind(&profile.notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse patch to a profile and returns the full updated row.
///
/// `Some(v)` sets a value, `None` preserves the existing one; for nullable
/// columns the supplied/value pair distinguishes "clear" from "keep".
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    patch: &ProfilePatch,
) -> Result<ProfileRow, DbError> {
    let notes_supplied = patch.notes.is_some();
    let notes_val = patch.notes.clone().flatten();

    let row = sqlx::query_as::<_, ProfileRow>(
        "UPDATE social_profiles \
         SET display_name = COALESCE($2, display_name), \
             handle       = COALESCE($3, handle), \
             platform     = COALESCE($4, platform), \
             is_active    = COALESCE($5, is_active), \
             notes        = CASE WHEN $6::BOOL THEN $7 ELSE notes END, \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING id, display_name, handle, platform, is_active, follower_count, \
                   growth_rate, engagement_rate, notes, metrics_refreshed_at, created_at, updated_at",
    )
    .bind(id)
    .bind(&patch.display_name)
    .bind(&patch.handle)
    .bind(patch.platform.as_ref().map(Platform::as_str))
    .bind(patch.is_active)
    .bind(notes_supplied)
    .bind(notes_val)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Applies a fetched metrics sample and stamps `metrics_refreshed_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn update_profile_metrics(
    pool: &PgPool,
    id: i64,
    metrics: &MetricsPatch,
) -> Result<ProfileRow, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "UPDATE social_profiles \
         SET follower_count       = $2, \
             growth_rate          = $3, \
             engagement_rate      = $4, \
             metrics_refreshed_at = NOW(), \
             updated_at           = NOW() \
         WHERE id = $1 \
         RETURNING id, display_name, handle, platform, is_active, follower_count, \
                   growth_rate, engagement_rate, notes, metrics_refreshed_at, created_at, updated_at",
    )
    .bind(id)
    .bind(metrics.follower_count)
    .bind(metrics.growth_rate)
    .bind(metrics.engagement_rate)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Hard-deletes a profile. Rare in practice; the common path toggles
/// `is_active` through [`update_profile`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is absent, [`DbError::Sqlx`] on
/// other failures.
pub async fn delete_profile(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM social_profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
