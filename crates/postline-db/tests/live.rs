//! Live integration tests for postline-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/postline-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{NaiveDate, TimeZone, Utc};
use postline_core::{
    ContentType, LaunchCategory, LaunchStatus, PhaseStatus, Platform, PostStatus,
};
use postline_db::{
    create_launch, create_launch_phase, create_post, create_profile, create_scheduled_post,
    delete_launch, get_launch_phase, get_post, list_due_scheduled_posts, list_launch_phases,
    list_posts, mark_scheduled_post_failed, mark_scheduled_post_sent, update_post, DbError,
    NewLaunch, NewLaunchPhase, NewPost, NewProfile, NewScheduledPost, PostListFilters, PostPatch,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_profile(pool: &sqlx::PgPool, handle: &str, platform: Platform) -> i64 {
    create_profile(
        pool,
        &NewProfile {
            display_name: format!("Profile {handle}"),
            handle: handle.to_string(),
            platform,
            notes: None,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("insert_test_profile failed for '{handle}': {e}"))
    .id
}

fn minimal_post(profile_ids: Vec<i64>, post_at: chrono::DateTime<Utc>) -> NewPost {
    NewPost {
        product_id: None,
        post_at,
        profile_ids,
        content_type: ContentType::Post,
        content_format: None,
        copies: vec![],
        hashtags: vec![],
        media_ids: vec![],
        status: PostStatus::Draft,
        launch_id: None,
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_post_derives_legacy_profile_id(pool: sqlx::PgPool) {
    let p1 = insert_test_profile(&pool, "ig-main", Platform::Instagram).await;
    let p2 = insert_test_profile(&pool, "tt-main", Platform::TikTok).await;

    let row = create_post(
        &pool,
        &minimal_post(vec![p1, p2], Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap()),
    )
    .await
    .expect("create post");

    assert_eq!(row.profile_ids, vec![p1, p2]);
    assert_eq!(row.profile_id, Some(p1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_post_recomputes_profile_id_with_new_targets(pool: sqlx::PgPool) {
    let p1 = insert_test_profile(&pool, "one", Platform::Instagram).await;
    let p2 = insert_test_profile(&pool, "two", Platform::Instagram).await;

    let row = create_post(
        &pool,
        &minimal_post(vec![p1], Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()),
    )
    .await
    .expect("create post");

    let updated = update_post(
        &pool,
        row.id,
        &PostPatch {
            profile_ids: Some(vec![p2, p1]),
            ..PostPatch::default()
        },
    )
    .await
    .expect("update post");

    assert_eq!(updated.profile_ids, vec![p2, p1]);
    assert_eq!(updated.profile_id, Some(p2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_post_without_profiles_leaves_legacy_field_alone(pool: sqlx::PgPool) {
    let p1 = insert_test_profile(&pool, "steady", Platform::Pinterest).await;

    let row = create_post(
        &pool,
        &minimal_post(vec![p1], Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()),
    )
    .await
    .expect("create post");

    let updated = update_post(
        &pool,
        row.id,
        &PostPatch {
            status: Some(PostStatus::Pending),
            ..PostPatch::default()
        },
    )
    .await
    .expect("update post");

    assert_eq!(updated.status, "pending");
    assert_eq!(updated.profile_id, Some(p1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_posts_date_range_is_inclusive_on_both_bounds(pool: sqlx::PgPool) {
    let p1 = insert_test_profile(&pool, "range", Platform::X).await;

    let start = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap();

    for at in [
        start,
        end,
        Utc.with_ymd_and_hms(2026, 5, 31, 23, 59, 59).unwrap(),
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
    ] {
        create_post(&pool, &minimal_post(vec![p1], at))
            .await
            .expect("create post");
    }

    let rows = list_posts(
        &pool,
        PostListFilters {
            launch_id: None,
            from: Some(start),
            to: Some(end),
        },
    )
    .await
    .expect("list posts");

    assert_eq!(rows.len(), 2, "exactly the boundary posts should match");
    assert_eq!(rows[0].post_at, start);
    assert_eq!(rows[1].post_at, end);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_post_returns_not_found_for_unknown_id(pool: sqlx::PgPool) {
    let result = update_post(
        &pool,
        999_999,
        &PostPatch {
            status: Some(PostStatus::Pending),
            ..PostPatch::default()
        },
    )
    .await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Launches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn delete_launch_cascades_phases_and_detaches_posts(pool: sqlx::PgPool) {
    let profile = insert_test_profile(&pool, "campaign", Platform::Instagram).await;

    let launch = create_launch(
        &pool,
        &NewLaunch {
            name: "Summer Drop".to_string(),
            product_id: None,
            category: LaunchCategory::Campaign,
            status: LaunchStatus::Planned,
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            responsible: Some("Sam".to_string()),
            description: None,
        },
    )
    .await
    .expect("create launch");

    let mut phase_ids = Vec::new();
    for name in ["Teaser", "Go live"] {
        let phase = create_launch_phase(
            &pool,
            &NewLaunchPhase {
                launch_id: launch.id,
                name: name.to_string(),
                status: PhaseStatus::NotStarted,
                start_date: None,
                end_date: None,
                responsible: None,
                notes: None,
            },
        )
        .await
        .expect("create phase");
        phase_ids.push(phase.id);
    }

    let mut post = minimal_post(vec![profile], Utc.with_ymd_and_hms(2026, 6, 10, 8, 0, 0).unwrap());
    post.launch_id = Some(launch.id);
    let post = create_post(&pool, &post).await.expect("create post");

    delete_launch(&pool, launch.id).await.expect("delete launch");

    for phase_id in phase_ids {
        assert!(get_launch_phase(&pool, phase_id)
            .await
            .expect("get phase")
            .is_none());
    }
    assert!(list_launch_phases(&pool, launch.id)
        .await
        .expect("list phases")
        .is_empty());

    let detached = get_post(&pool, post.id)
        .await
        .expect("get post")
        .expect("post survives launch deletion");
    assert_eq!(detached.launch_id, None);
}

// ---------------------------------------------------------------------------
// Publish queue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scheduled_post_dispatch_transitions_are_gated(pool: sqlx::PgPool) {
    let profile = insert_test_profile(&pool, "queue", Platform::YouTube).await;

    let job = create_scheduled_post(
        &pool,
        &NewScheduledPost {
            profile_id: profile,
            content: "premiere tonight".to_string(),
            hashtags: vec!["#live".to_string()],
            media_urls: vec![],
            scheduled_for: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        },
    )
    .await
    .expect("create job");
    assert_eq!(job.status, "pending");

    let due = list_due_scheduled_posts(&pool, Utc::now(), 10)
        .await
        .expect("list due");
    assert!(due.iter().any(|row| row.id == job.id));

    mark_scheduled_post_sent(&pool, job.id, "yt-123")
        .await
        .expect("mark sent");

    // A second transition out of pending is rejected either way.
    let resend = mark_scheduled_post_sent(&pool, job.id, "yt-456").await;
    assert!(matches!(
        resend,
        Err(DbError::InvalidScheduleTransition { .. })
    ));
    let fail = mark_scheduled_post_failed(&pool, job.id, "too late").await;
    assert!(matches!(
        fail,
        Err(DbError::InvalidScheduleTransition { .. })
    ));
}
