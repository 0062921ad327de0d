//! Offline unit tests for postline-db pool configuration and row types.
//! These tests do not require a live database connection.

use postline_core::{AppConfig, Environment};
use postline_db::{PoolConfig, PostRow, ScheduledPostRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        publisher_request_timeout_secs: 30,
        publisher_user_agent: "ua".to_string(),
        dispatch_cron: "0 * * * * *".to_string(),
        cache_volatile_ttl_secs: 120,
        cache_standard_ttl_secs: 300,
        cache_static_ttl_secs: 900,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`PostRow`] has all expected fields
/// with the correct types. No database required.
#[test]
fn post_row_has_expected_fields() {
    use chrono::Utc;

    let row = PostRow {
        id: 1_i64,
        product_id: None,
        post_at: Utc::now(),
        profile_ids: vec![4, 5],
        profile_id: Some(4),
        content_type: "reel".to_string(),
        content_format: Some("vertical".to_string()),
        copies: serde_json::json!([]),
        hashtags: vec!["#launch".to_string()],
        media_ids: vec![],
        status: "draft".to_string(),
        launch_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.profile_id, row.profile_ids.first().copied());
    assert_eq!(row.content_type, "reel");
    assert!(postline_core::parse_copies(&row.copies).is_some());
}

#[test]
fn scheduled_post_row_has_expected_fields() {
    use chrono::Utc;

    let row = ScheduledPostRow {
        id: 9,
        profile_id: 3,
        content: "going live".to_string(),
        hashtags: vec![],
        media_urls: vec!["https://cdn.example.com/a.jpg".to_string()],
        scheduled_for: Utc::now(),
        status: "pending".to_string(),
        external_id: None,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.status, "pending");
    assert!(row.external_id.is_none());
}
