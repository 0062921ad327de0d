//! Profile handlers, including the metrics refresh proxy.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use postline_core::Platform;
use postline_db::{MetricsPatch, NewProfile, ProfilePatch, ProfileRow};

use crate::middleware::RequestId;

use super::{map_db_error, map_publisher_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProfileItem {
    id: i64,
    display_name: String,
    handle: String,
    platform: String,
    is_active: bool,
    follower_count: Option<i64>,
    growth_rate: Option<Decimal>,
    engagement_rate: Option<Decimal>,
    notes: Option<String>,
    metrics_refreshed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&ProfileRow> for ProfileItem {
    fn from(row: &ProfileRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name.clone(),
            handle: row.handle.clone(),
            platform: row.platform.clone(),
            is_active: row.is_active,
            follower_count: row.follower_count,
            growth_rate: row.growth_rate,
            engagement_rate: row.engagement_rate,
            notes: row.notes.clone(),
            metrics_refreshed_at: row.metrics_refreshed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProfileRequest {
    pub display_name: String,
    pub handle: String,
    pub platform: String,
    pub notes: Option<String>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub platform: Option<String>,
    pub is_active: Option<bool>,
    pub notes: Option<Option<String>>,
}

fn validate_name(req_id: &str, field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("'{field}' must be 1–200 characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

fn validate_platform(req_id: &str, value: &str) -> Result<Platform, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "'platform' must be non-empty",
        ));
    }
    Ok(Platform::from(value.trim()))
}

fn map_unique_violation(req_id: &str, e: &postline_db::DbError) -> ApiError {
    if let postline_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                req_id,
                "conflict",
                "a profile with that handle already exists on this platform",
            );
        }
    }
    map_db_error(req_id.to_owned(), e)
}

/// GET /api/v1/profiles — list profiles, optionally by active flag.
pub(super) async fn list_profiles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ApiResponse<Vec<ProfileItem>>>, ApiError> {
    let rows = state
        .store
        .profiles()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .iter()
        .filter(|row| query.active.is_none_or(|want| row.is_active == want))
        .map(ProfileItem::from)
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/profiles/:id
pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let row = state
        .store
        .profile(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "profile not found"))?;

    Ok(Json(ApiResponse {
        data: ProfileItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/profiles — create a profile.
pub(super) async fn create_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProfileItem>>), ApiError> {
    let rid = &req_id.0;

    let display_name = validate_name(rid, "display_name", &body.display_name)?;
    let handle = validate_name(rid, "handle", &body.handle)?;
    let platform = validate_platform(rid, &body.platform)?;

    let row = state
        .store
        .create_profile(&NewProfile {
            display_name,
            handle,
            platform,
            notes: body.notes,
        })
        .await
        .map_err(|e| map_unique_violation(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProfileItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/profiles/:id — sparse update; toggling `is_active` is the
/// common "retire a profile" path.
pub(super) async fn update_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let rid = &req_id.0;

    let display_name = body
        .display_name
        .as_deref()
        .map(|v| validate_name(rid, "display_name", v))
        .transpose()?;
    let handle = body
        .handle
        .as_deref()
        .map(|v| validate_name(rid, "handle", v))
        .transpose()?;
    let platform = body
        .platform
        .as_deref()
        .map(|v| validate_platform(rid, v))
        .transpose()?;

    let row = state
        .store
        .update_profile(
            id,
            &ProfilePatch {
                display_name,
                handle,
                platform,
                is_active: body.is_active,
                notes: body.notes,
            },
        )
        .await
        .map_err(|e| map_unique_violation(rid, &e))?;

    Ok(Json(ApiResponse {
        data: ProfileItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/profiles/:id — hard delete; rare, the UI prefers
/// deactivation.
pub(super) async fn delete_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_profile(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/profiles/:id/metrics/refresh — pull a fresh sample from the
/// platform connector and persist it.
pub(super) async fn refresh_profile_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let rid = &req_id.0;

    let profile = state
        .store
        .profile(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "profile not found"))?;

    let platform = Platform::from(profile.platform.as_str());
    let sample = state
        .publisher
        .fetch_metrics(&platform, &profile.handle)
        .await
        .map_err(|e| map_publisher_error(rid.clone(), &e))?;

    let row = state
        .store
        .apply_profile_metrics(
            id,
            &MetricsPatch {
                follower_count: sample.follower_count,
                growth_rate: sample.growth_rate,
                engagement_rate: sample.engagement_rate,
            },
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProfileItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
