//! Publish-queue handlers.
//!
//! Queue rows are deliberately separate from editorial posts; creating one
//! never touches `social_posts`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postline_cache::Scope;
use postline_core::{Platform, ScheduleStatus};
use postline_db::{NewScheduledPost, ScheduledPostRow};
use postline_publisher::OutboundPost;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_reference_violation, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct ScheduledPostItem {
    id: i64,
    profile_id: i64,
    content: String,
    hashtags: Vec<String>,
    media_urls: Vec<String>,
    scheduled_for: DateTime<Utc>,
    status: String,
    external_id: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<&ScheduledPostRow> for ScheduledPostItem {
    fn from(row: &ScheduledPostRow) -> Self {
        Self {
            id: row.id,
            profile_id: row.profile_id,
            content: row.content.clone(),
            hashtags: row.hashtags.clone(),
            media_urls: row.media_urls.clone(),
            scheduled_for: row.scheduled_for,
            status: row.status.clone(),
            external_id: row.external_id.clone(),
            error_message: row.error_message.clone(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ScheduledPostQuery {
    pub profile_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateScheduledPostRequest {
    pub profile_id: i64,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
}

/// GET /api/v1/scheduled-posts — queue rows in dispatch order.
pub(super) async fn list_scheduled_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScheduledPostQuery>,
) -> Result<Json<ApiResponse<Vec<ScheduledPostItem>>>, ApiError> {
    let rid = &req_id.0;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<ScheduleStatus>)
        .transpose()
        .map_err(|e| ApiError::new(rid.clone(), "validation_error", e.to_string()))?;

    let scope = match query.profile_id {
        Some(id) => Scope::Profile(id),
        None => Scope::All,
    };

    let rows = state
        .store
        .scheduled_posts(scope)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = rows
        .iter()
        .filter(|row| status.is_none_or(|want| row.status == want.as_str()))
        .map(ScheduledPostItem::from)
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/scheduled-posts/:id
pub(super) async fn get_scheduled_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ScheduledPostItem>>, ApiError> {
    let row = state
        .store
        .scheduled_post(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "scheduled post not found"))?;

    Ok(Json(ApiResponse {
        data: ScheduledPostItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/scheduled-posts — enqueue a publish job.
pub(super) async fn create_scheduled_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateScheduledPostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduledPostItem>>), ApiError> {
    let rid = &req_id.0;

    if body.content.trim().is_empty() {
        return Err(ApiError::new(
            rid.clone(),
            "validation_error",
            "'content' must be non-empty",
        ));
    }

    let row = state
        .store
        .create_scheduled_post(&NewScheduledPost {
            profile_id: body.profile_id,
            content: body.content,
            hashtags: body.hashtags,
            media_urls: body.media_urls,
            scheduled_for: body.scheduled_for,
        })
        .await
        .map_err(|e| map_reference_violation(rid, "profile_id", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ScheduledPostItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// DELETE /api/v1/scheduled-posts/:id — cancel a queued job.
pub(super) async fn cancel_scheduled_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_scheduled_post(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "canceled": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/scheduled-posts/:id/dispatch — publish now instead of
/// waiting for the sweep. The outcome is recorded either way.
pub(super) async fn dispatch_scheduled_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ScheduledPostItem>>, ApiError> {
    let rid = &req_id.0;

    let row = state
        .store
        .scheduled_post(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "scheduled post not found"))?;

    if row.status != ScheduleStatus::Pending.as_str() {
        return Err(ApiError::new(
            rid.clone(),
            "conflict",
            format!("scheduled post {id} is not pending"),
        ));
    }

    let profile = state
        .store
        .profile(row.profile_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "profile not found"))?;

    let platform = Platform::from(profile.platform.as_str());
    let outbound = OutboundPost {
        content: row.content.clone(),
        hashtags: row.hashtags.clone(),
        media_urls: row.media_urls.clone(),
        scheduled_for: row.scheduled_for,
    };

    match state
        .publisher
        .schedule_post(&platform, &profile.handle, &outbound)
        .await
    {
        Ok(receipt) => {
            state
                .store
                .mark_scheduled_post_sent(id, &receipt.external_id)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
        }
        Err(e) => {
            tracing::error!(error = %e, scheduled_post_id = id, "dispatch failed");
            state
                .store
                .mark_scheduled_post_failed(id, &e.to_string())
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
        }
    }

    let row = state
        .store
        .scheduled_post(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "scheduled post not found"))?;

    Ok(Json(ApiResponse {
        data: ScheduledPostItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}
