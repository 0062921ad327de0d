//! Post handlers: CRUD, conjunctive list filtering, and the calendar view.
//!
//! `launch_id` and the date range are pushed down as cache scopes; profile,
//! status, content type and platform narrow the fetched collection locally,
//! the same computation the month view uses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use postline_cache::Scope;
use postline_core::{
    composer::validate_copies, day_buckets, ContentFormat, ContentType, DateRange, Platform,
    PlatformCopy, PostComposer, PostFilter, PostStatus, ProfileRef, ValidationError,
};
use postline_db::{NewPost, PostPatch, PostRow, ProfileRow};

use crate::middleware::RequestId;

use super::{map_db_error, map_reference_violation, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct PostItem {
    id: i64,
    product_id: Option<i64>,
    post_at: DateTime<Utc>,
    profile_ids: Vec<i64>,
    profile_id: Option<i64>,
    content_type: String,
    content_format: Option<String>,
    copies: Vec<PlatformCopy>,
    hashtags: Vec<String>,
    media_ids: Vec<i64>,
    status: String,
    launch_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&PostRow> for PostItem {
    fn from(row: &PostRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            post_at: row.post_at,
            profile_ids: row.profile_ids.clone(),
            profile_id: row.profile_id,
            content_type: row.content_type.clone(),
            content_format: row.content_format.clone(),
            copies: postline_core::parse_copies(&row.copies).unwrap_or_default(),
            hashtags: row.hashtags.clone(),
            media_ids: row.media_ids.clone(),
            status: row.status.clone(),
            launch_id: row.launch_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PostQuery {
    pub launch_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub profile_id: Option<i64>,
    pub status: Option<String>,
    pub content_type: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct CalendarDay {
    date: NaiveDate,
    posts: Vec<PostItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatePostRequest {
    pub product_id: Option<i64>,
    pub post_at: DateTime<Utc>,
    pub profile_ids: Vec<i64>,
    pub content_type: ContentType,
    pub content_format: Option<ContentFormat>,
    #[serde(default)]
    pub copies: Vec<PlatformCopy>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub media_ids: Vec<i64>,
    pub status: Option<PostStatus>,
    pub launch_id: Option<i64>,
}

#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdatePostRequest {
    pub product_id: Option<Option<i64>>,
    pub post_at: Option<DateTime<Utc>>,
    pub profile_ids: Option<Vec<i64>>,
    pub content_type: Option<ContentType>,
    pub content_format: Option<Option<ContentFormat>>,
    pub copies: Option<Vec<PlatformCopy>>,
    pub hashtags: Option<Vec<String>>,
    pub media_ids: Option<Vec<i64>>,
    pub status: Option<PostStatus>,
    pub launch_id: Option<Option<i64>>,
}

fn map_validation(req_id: &str, error: &ValidationError) -> ApiError {
    ApiError::new(req_id, "validation_error", error.to_string())
}

fn parse_filter(req_id: &str, query: &PostQuery) -> Result<PostFilter, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PostStatus>)
        .transpose()
        .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))?;
    let content_type = query
        .content_type
        .as_deref()
        .map(str::parse::<ContentType>)
        .transpose()
        .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))?;
    let platform = query.platform.as_deref().map(Platform::from);

    Ok(PostFilter {
        profile_id: query.profile_id,
        status,
        content_type,
        platform,
    })
}

fn profile_refs(rows: &[ProfileRow]) -> Vec<ProfileRef> {
    rows.iter()
        .map(|row| ProfileRef {
            id: row.id,
            platform: Platform::from(row.platform.as_str()),
        })
        .collect()
}

/// Run submitted copies through the composer: explicit entries land on
/// their profile, legacy platform-level entries broadcast first-write-wins,
/// and the export carries one entry per selected profile with its id
/// resolved. What gets stored is always the normalized per-profile form.
fn normalize_copies(
    copies: &[PlatformCopy],
    profile_ids: &[i64],
    profiles: &[ProfileRef],
) -> Vec<PlatformCopy> {
    let mut composer = PostComposer::new();
    composer.sync_selection(profile_ids);
    composer.import_copies(copies, profiles);
    composer.export(profiles)
}

fn row_passes(row: &PostRow, filter: &PostFilter, profiles: &[ProfileRef]) -> bool {
    filter.matches(
        row.status.parse::<PostStatus>().ok(),
        row.content_type.parse::<ContentType>().ok(),
        &row.profile_ids,
        profiles,
    )
}

/// GET /api/v1/posts — scoped, filtered list in calendar order.
pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostQuery>,
) -> Result<Json<ApiResponse<Vec<PostItem>>>, ApiError> {
    let rid = &req_id.0;

    let scope = match (query.launch_id, query.from, query.to) {
        (Some(launch_id), _, _) => Scope::Launch(launch_id),
        (None, Some(from), Some(to)) => {
            let range = DateRange::new(from, to).map_err(|e| map_validation(rid, &e))?;
            Scope::Between(range.start, range.end)
        }
        _ => Scope::All,
    };

    let filter = parse_filter(rid, &query)?;
    let rows = state
        .store
        .posts(scope)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let refs = if filter.is_empty() {
        Vec::new()
    } else {
        let profiles = state
            .store
            .profiles()
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
        profile_refs(&profiles)
    };

    let data = rows
        .iter()
        .filter(|row| row_passes(row, &filter, &refs))
        .map(PostItem::from)
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/posts/calendar?year=&month= — one bucket per day of the
/// month, UTC date equality.
pub(super) async fn calendar(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<ApiResponse<Vec<CalendarDay>>>, ApiError> {
    let rid = &req_id.0;

    let range = DateRange::month(query.year, query.month).ok_or_else(|| {
        ApiError::new(
            rid.clone(),
            "validation_error",
            format!("{}-{:02} is not a valid month", query.year, query.month),
        )
    })?;

    let rows = state
        .store
        .posts(Scope::Between(range.start, range.end))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = day_buckets(&range, &rows, |row| row.post_at)
        .into_iter()
        .map(|bucket| CalendarDay {
            date: bucket.date,
            posts: bucket.items.into_iter().map(PostItem::from).collect(),
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/posts/:id
pub(super) async fn get_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PostItem>>, ApiError> {
    let row = state
        .store
        .post(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "post not found"))?;

    Ok(Json(ApiResponse {
        data: PostItem::from(row.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/posts — create a post. Submission preconditions hold here,
/// before anything is persisted: a non-empty profile selection and copies
/// that only reference selected profiles.
pub(super) async fn create_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostItem>>), ApiError> {
    let rid = &req_id.0;

    if body.profile_ids.is_empty() {
        return Err(map_validation(rid, &ValidationError::NoProfilesSelected));
    }
    validate_copies(&body.copies, &body.profile_ids).map_err(|e| map_validation(rid, &e))?;

    let profiles = state
        .store
        .profiles()
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let copies = normalize_copies(&body.copies, &body.profile_ids, &profile_refs(&profiles));

    let row = state
        .store
        .create_post(&NewPost {
            product_id: body.product_id,
            post_at: body.post_at,
            profile_ids: body.profile_ids,
            content_type: body.content_type,
            content_format: body.content_format,
            copies,
            hashtags: body.hashtags,
            media_ids: body.media_ids,
            status: body.status.unwrap_or(PostStatus::Draft),
            launch_id: body.launch_id,
        })
        .await
        .map_err(|e| map_reference_violation(rid, "launch_id or product_id", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PostItem::from(&row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/posts/:id — sparse update with status-transition
/// validation against the current row.
pub(super) async fn update_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostItem>>, ApiError> {
    let rid = &req_id.0;

    let current = state
        .store
        .post(id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid.clone(), "not_found", "post not found"))?;

    if let Some(next) = body.status {
        if let Ok(from) = current.status.parse::<PostStatus>() {
            if !from.can_transition(next) {
                return Err(map_validation(
                    rid,
                    &ValidationError::InvalidStatusTransition {
                        from: from.to_string(),
                        to: next.to_string(),
                    },
                ));
            }
        }
    }

    // Targeting after the patch must stay non-empty, and submitted copies
    // may only reference profiles in the effective selection.
    let effective_profiles: Vec<i64> = body
        .profile_ids
        .clone()
        .unwrap_or_else(|| current.profile_ids.clone());
    if effective_profiles.is_empty() {
        return Err(map_validation(rid, &ValidationError::NoProfilesSelected));
    }
    if let Some(ref copies) = body.copies {
        validate_copies(copies, &effective_profiles).map_err(|e| map_validation(rid, &e))?;
    }

    // When targeting or copy changes, re-run the composer over the
    // effective state so the stored list tracks the selection: new profiles
    // get entries, deselected profiles lose theirs.
    let copies = if body.copies.is_some() || body.profile_ids.is_some() {
        let provided = body
            .copies
            .clone()
            .or_else(|| postline_core::parse_copies(&current.copies))
            .unwrap_or_default();
        let profiles = state
            .store
            .profiles()
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
        Some(normalize_copies(
            &provided,
            &effective_profiles,
            &profile_refs(&profiles),
        ))
    } else {
        None
    };

    let row = state
        .store
        .update_post(
            id,
            &PostPatch {
                product_id: body.product_id,
                post_at: body.post_at,
                profile_ids: body.profile_ids,
                content_type: body.content_type,
                content_format: body.content_format,
                copies,
                hashtags: body.hashtags,
                media_ids: body.media_ids,
                status: body.status,
                launch_id: body.launch_id,
            },
        )
        .await
        .map_err(|e| map_reference_violation(rid, "launch_id or product_id", &e))?;

    Ok(Json(ApiResponse {
        data: PostItem::from(&row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/posts/:id
pub(super) async fn delete_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state
        .store
        .delete_post(id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
