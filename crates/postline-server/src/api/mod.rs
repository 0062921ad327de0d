mod launches;
mod media_kit;
mod posts;
mod products;
mod profiles;
mod protocols;
mod scheduled_posts;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use postline_cache::Store;
use postline_db::DbError;
use postline_publisher::{Publisher, PublisherError};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub publisher: Publisher,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Map a data-layer error onto the response taxonomy. Store-side failures
/// keep their context in the log and surface a generic message.
pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::InvalidScheduleTransition { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "database operation failed");
            ApiError::new(request_id, "internal_error", "database operation failed")
        }
    }
}

/// Map a connector error; the upstream message is logged, not echoed.
pub(super) fn map_publisher_error(request_id: String, error: &PublisherError) -> ApiError {
    tracing::error!(error = %error, "platform connector call failed");
    ApiError::new(request_id, "upstream_error", "platform connector call failed")
}

/// Map foreign-key violations (Postgres 23503) onto a validation error so a
/// dangling reference in a request body reads as the caller's mistake.
pub(super) fn map_reference_violation(
    request_id: &str,
    field: &str,
    error: &DbError,
) -> ApiError {
    if let DbError::Sqlx(sqlx::Error::Database(db_err)) = error {
        if db_err.code().as_deref() == Some("23503") {
            return ApiError::new(
                request_id,
                "validation_error",
                format!("'{field}' references a record that does not exist"),
            );
        }
    }
    map_db_error(request_id.to_owned(), error)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/api/v1/profiles/{id}",
            get(profiles::get_profile)
                .patch(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route(
            "/api/v1/profiles/{id}/metrics/refresh",
            axum::routing::post(profiles::refresh_profile_metrics),
        )
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/v1/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route("/api/v1/posts/calendar", get(posts::calendar))
        .route(
            "/api/v1/posts/{id}",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/api/v1/launches",
            get(launches::list_launches).post(launches::create_launch),
        )
        .route(
            "/api/v1/launches/{id}",
            get(launches::get_launch)
                .patch(launches::update_launch)
                .delete(launches::delete_launch),
        )
        .route(
            "/api/v1/launches/{id}/phases",
            get(launches::list_phases).post(launches::create_phase),
        )
        .route(
            "/api/v1/phases/{id}",
            axum::routing::patch(launches::update_phase).delete(launches::delete_phase),
        )
        .route(
            "/api/v1/protocols",
            get(protocols::list_protocols).post(protocols::create_protocol),
        )
        .route(
            "/api/v1/protocols/{id}",
            get(protocols::get_protocol)
                .patch(protocols::update_protocol)
                .delete(protocols::delete_protocol),
        )
        .route(
            "/api/v1/media-kit",
            get(media_kit::list_resources).post(media_kit::create_resource),
        )
        .route(
            "/api/v1/media-kit/{id}",
            get(media_kit::get_resource)
                .patch(media_kit::update_resource)
                .delete(media_kit::delete_resource),
        )
        .route(
            "/api/v1/scheduled-posts",
            get(scheduled_posts::list_scheduled_posts).post(scheduled_posts::create_scheduled_post),
        )
        .route(
            "/api/v1/scheduled-posts/{id}",
            get(scheduled_posts::get_scheduled_post).delete(scheduled_posts::cancel_scheduled_post),
        )
        .route(
            "/api/v1/scheduled-posts/{id}/dispatch",
            axum::routing::post(scheduled_posts::dispatch_scheduled_post),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match postline_db::health_check(state.store.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "record not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_upstream_error_maps_to_bad_gateway() {
        let response = ApiError::new("req-1", "upstream_error", "connector down").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn map_db_error_distinguishes_not_found() {
        let err = map_db_error("req-2".to_string(), &DbError::NotFound);
        assert_eq!(err.error.code, "not_found");

        let err = map_db_error(
            "req-2".to_string(),
            &DbError::InvalidScheduleTransition {
                id: 1,
                expected_status: "pending",
            },
        );
        assert_eq!(err.error.code, "conflict");
    }

    // -------------------------------------------------------------------------
    // Route integration tests (with DB)
    // -------------------------------------------------------------------------

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use postline_cache::FreshnessPolicy;
    use postline_publisher::{Credentials, PublisherConfig};
    use tower::ServiceExt;

    fn test_app(pool: sqlx::PgPool) -> Router {
        let store = Arc::new(Store::new(pool, FreshnessPolicy::default()));
        let publisher = Publisher::new(&PublisherConfig::default(), Credentials::default())
            .expect("publisher");
        let auth = AuthState::from_env(true).expect("auth");
        build_app(AppState { store, publisher }, auth, default_rate_limit_state())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        };
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json parse")
        };
        (status, json)
    }

    async fn seed_profile(app: &Router, handle: &str, platform: &str) -> i64 {
        let (status, json) = send(
            app,
            "POST",
            "/api/v1/profiles",
            Some(serde_json::json!({
                "display_name": format!("Profile {handle}"),
                "handle": handle,
                "platform": platform,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "seed profile: {json}");
        json["data"]["id"].as_i64().expect("profile id")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, json) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn profiles_roundtrip_through_the_cache(pool: sqlx::PgPool) {
        let app = test_app(pool);
        seed_profile(&app, "brand.main", "instagram").await;

        let (status, json) = send(&app, "GET", "/api/v1/profiles", None).await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["handle"].as_str(), Some("brand.main"));
        assert_eq!(data[0]["platform"].as_str(), Some("instagram"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_post_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, json) = send(&app, "GET", "/api/v1/posts/424242", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"].as_str(), Some("not_found"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_post_requires_a_profile_selection(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-15T09:00:00Z",
                "profile_ids": [],
                "content_type": "post",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_post_rejects_copies_for_unselected_profiles(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let p1 = seed_profile(&app, "ig", "instagram").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-15T09:00:00Z",
                "profile_ids": [p1],
                "content_type": "post",
                "copies": [
                    { "platform": "instagram", "content": "hello", "profile_id": p1 + 1 }
                ],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn multi_profile_post_keeps_per_profile_copies(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let ig = seed_profile(&app, "ig", "instagram").await;
        let tt = seed_profile(&app, "tt", "tiktok").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-15T09:00:00Z",
                "profile_ids": [ig, tt],
                "content_type": "reel",
                "copies": [
                    { "platform": "instagram", "content": "ig copy", "profile_id": ig },
                    { "platform": "tiktok", "content": "tt copy", "profile_id": tt }
                ],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["data"]["profile_id"].as_i64(), Some(ig));
        let copies = json["data"]["copies"].as_array().expect("copies");
        assert_eq!(copies.len(), 2);
        assert_eq!(copies[0]["profile_id"].as_i64(), Some(ig));
        assert_eq!(copies[1]["profile_id"].as_i64(), Some(tt));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn post_status_walks_the_transition_graph(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let ig = seed_profile(&app, "ig", "instagram").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-15T09:00:00Z",
                "profile_ids": [ig],
                "content_type": "post",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["data"]["id"].as_i64().expect("post id");

        // Draft cannot jump straight to published.
        let (status, json) = send(
            &app,
            "PATCH",
            &format!("/api/v1/posts/{id}"),
            Some(serde_json::json!({ "status": "published" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));

        // Draft → pending → approved → published walks fine.
        for next in ["pending", "approved", "published"] {
            let (status, json) = send(
                &app,
                "PATCH",
                &format!("/api/v1/posts/{id}"),
                Some(serde_json::json!({ "status": next })),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "transition to {next}: {json}");
            assert_eq!(json["data"]["status"].as_str(), Some(next));
        }

        // Published is terminal.
        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/v1/posts/{id}"),
            Some(serde_json::json!({ "status": "canceled" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn post_filters_are_conjunctive(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let ig = seed_profile(&app, "ig", "instagram").await;

        for (content_type, status_str) in [("reel", "approved"), ("reel", "draft"), ("post", "approved")] {
            let (status, json) = send(
                &app,
                "POST",
                "/api/v1/posts",
                Some(serde_json::json!({
                    "post_at": "2026-06-15T09:00:00Z",
                    "profile_ids": [ig],
                    "content_type": content_type,
                    "status": status_str,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{json}");
        }

        let (status, json) = send(
            &app,
            "GET",
            "/api/v1/posts?status=approved&content_type=reel",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1, "exactly one post matches both dimensions");
        assert_eq!(data[0]["status"].as_str(), Some("approved"));
        assert_eq!(data[0]["content_type"].as_str(), Some("reel"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn calendar_buckets_a_late_evening_post_on_its_utc_day(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let ig = seed_profile(&app, "ig", "instagram").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-15T23:59:00Z",
                "profile_ids": [ig],
                "content_type": "post",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) =
            send(&app, "GET", "/api/v1/posts/calendar?year=2026&month=6", None).await;
        assert_eq!(status, StatusCode::OK);
        let days = json["data"].as_array().expect("days");
        assert_eq!(days.len(), 30);
        assert_eq!(days[14]["date"].as_str(), Some("2026-06-15"));
        assert_eq!(days[14]["posts"].as_array().map(Vec::len), Some(1));
        assert_eq!(days[15]["posts"].as_array().map(Vec::len), Some(0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn deleting_a_launch_removes_phases_and_detaches_posts(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let ig = seed_profile(&app, "ig", "instagram").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/launches",
            Some(serde_json::json!({
                "name": "Summer Drop",
                "category": "campaign",
                "start_date": "2026-06-01",
                "end_date": "2026-06-30",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let launch_id = json["data"]["id"].as_i64().expect("launch id");

        for name in ["Teaser", "Go live"] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/api/v1/launches/{launch_id}/phases"),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({
                "post_at": "2026-06-10T08:00:00Z",
                "profile_ids": [ig],
                "content_type": "post",
                "launch_id": launch_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let post_id = json["data"]["id"].as_i64().expect("post id");

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/launches/{launch_id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send(&app, "GET", &format!("/api/v1/launches/{launch_id}/phases"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "launch is gone, so are its phases");

        let (status, json) = send(&app, "GET", &format!("/api/v1/posts/{post_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["launch_id"].is_null(), "post is detached, not deleted");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn dispatching_a_scheduled_post_records_the_receipt(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let yt = seed_profile(&app, "brand", "youtube").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/scheduled-posts",
            Some(serde_json::json!({
                "profile_id": yt,
                "content": "premiere tonight",
                "scheduled_for": "2026-01-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let id = json["data"]["id"].as_i64().expect("id");
        assert_eq!(json["data"]["status"].as_str(), Some("pending"));

        // No credentials in the test environment: the connector synthesizes.
        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/v1/scheduled-posts/{id}/dispatch"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["data"]["status"].as_str(), Some("sent"));
        let external = json["data"]["external_id"].as_str().expect("external id");
        assert!(external.starts_with("youtube-"));

        // A second dispatch is rejected: the row is no longer pending.
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/scheduled-posts/{id}/dispatch"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn scheduled_post_for_unknown_profile_is_a_validation_error(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let (status, json) = send(
            &app,
            "POST",
            "/api/v1/scheduled-posts",
            Some(serde_json::json!({
                "profile_id": 999_999,
                "content": "orphan",
                "scheduled_for": "2026-01-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }
}
