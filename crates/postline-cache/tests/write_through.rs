//! Write-through behavior over real post rows, no database involved: the
//! fetch closures stand in for the data-access layer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use postline_cache::{CacheRecord, EntityKind, ListCache, Scope};
use postline_db::PostRow;

fn post(id: i64, launch_id: Option<i64>, status: &str) -> PostRow {
    PostRow {
        id,
        product_id: None,
        post_at: Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap() + chrono::Duration::hours(id),
        profile_ids: vec![1],
        profile_id: Some(1),
        content_type: "post".to_string(),
        content_format: None,
        copies: serde_json::json!([]),
        hashtags: vec![],
        media_ids: vec![],
        status: status.to_string(),
        launch_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn status_update_reaches_every_view_without_a_refetch() {
    let cache: ListCache<PostRow> = ListCache::new(EntityKind::SocialPost, Duration::from_secs(300));

    // Two screens: the global calendar and a launch-filtered list.
    cache
        .read_with(Scope::All, || async {
            Ok(vec![post(1, Some(7), "approved"), post(2, None, "draft")])
        })
        .await
        .unwrap();
    cache
        .read_with(Scope::Launch(7), || async {
            Ok(vec![post(1, Some(7), "approved")])
        })
        .await
        .unwrap();

    cache.apply_updated(post(1, Some(7), "published")).await;

    // Both reads are still inside the freshness window; a refetch would hit
    // the panicking fetch below.
    let all = cache
        .read_with(Scope::All, || async { panic!("unexpected refetch") })
        .await
        .unwrap();
    let launch = cache
        .read_with(Scope::Launch(7), || async { panic!("unexpected refetch") })
        .await
        .unwrap();

    assert_eq!(all.iter().find(|p| p.id == 1).unwrap().status, "published");
    assert_eq!(launch.iter().find(|p| p.id == 1).unwrap().status, "published");
    assert_eq!(all.iter().find(|p| p.id == 2).unwrap().status, "draft");
}

#[tokio::test]
async fn created_post_lands_in_date_scoped_lists_in_calendar_order() {
    let cache: ListCache<PostRow> = ListCache::new(EntityKind::SocialPost, Duration::from_secs(300));

    let june = Scope::Between(
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap(),
    );

    cache
        .read_with(june, || async { Ok(vec![post(1, None, "draft"), post(5, None, "draft")]) })
        .await
        .unwrap();

    // post(3) sorts between post(1) and post(5) by post_at.
    cache.apply_created(post(3, None, "draft")).await;

    let rows = cache
        .read_with(june, || async { panic!("unexpected refetch") })
        .await
        .unwrap();
    assert_eq!(rows.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3, 5]);
}

#[tokio::test]
async fn scope_membership_mirrors_the_queries() {
    let in_june = post(1, Some(4), "draft");
    assert!(in_june.matches_scope(&Scope::All));
    assert!(in_june.matches_scope(&Scope::Launch(4)));
    assert!(!in_june.matches_scope(&Scope::Launch(5)));
    assert!(in_june.matches_scope(&Scope::Profile(1)));
    assert!(!in_june.matches_scope(&Scope::Profile(2)));

    let june = Scope::Between(
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap(),
    );
    assert!(in_june.matches_scope(&june));

    let may = Scope::Between(
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 5, 31, 23, 59, 59).unwrap(),
    );
    assert!(!in_june.matches_scope(&may));
}

#[tokio::test]
async fn arc_snapshots_are_immutable_views() {
    let cache: ListCache<PostRow> = ListCache::new(EntityKind::SocialPost, Duration::from_secs(300));

    let before: Arc<Vec<PostRow>> = cache
        .read_with(Scope::All, || async { Ok(vec![post(1, None, "draft")]) })
        .await
        .unwrap();

    cache.apply_updated(post(1, None, "pending")).await;

    // The snapshot handed out earlier is unchanged; a new read sees the patch.
    assert_eq!(before[0].status, "draft");
    let after = cache
        .read_with(Scope::All, || async { panic!("unexpected refetch") })
        .await
        .unwrap();
    assert_eq!(after[0].status, "pending");
}
