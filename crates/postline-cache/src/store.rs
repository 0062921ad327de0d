//! The repository object composing data access with the cache layer.
//!
//! One `Store` is built at startup and shared by every handler and the
//! dispatch scheduler, so all screens read and patch the same cached state.
//! There is no module-level state; dropping the `Store` drops the cache.
//!
//! Every mutation calls the database first. Only a successful row comes
//! back through the write-through hooks, so a failed mutation leaves the
//! cache exactly as it was. Parent invalidation follows the table in
//! [`crate::key::invalidation_targets`].

use std::sync::Arc;

use sqlx::PgPool;

use postline_db::{
    DbError, LaunchPatch, LaunchPhasePatch, LaunchPhaseRow, LaunchRow, MediaKitResourcePatch,
    MediaKitResourceRow, MetricsPatch, NewLaunch, NewLaunchPhase, NewMediaKitResource, NewPost,
    NewProduct, NewProfile, NewProtocol, NewScheduledPost, PostListFilters, PostPatch, PostRow,
    ProductPatch, ProductRow, ProfilePatch, ProfileRow, ProtocolPatch, ProtocolRow,
    ScheduledPostFilters, ScheduledPostRow,
};

use crate::freshness::FreshnessPolicy;
use crate::key::{invalidation_targets, EntityKind, Scope};
use crate::list_cache::ListCache;

pub struct Store {
    pool: PgPool,
    profiles: ListCache<ProfileRow>,
    products: ListCache<ProductRow>,
    posts: ListCache<PostRow>,
    launches: ListCache<LaunchRow>,
    phases: ListCache<LaunchPhaseRow>,
    protocols: ListCache<ProtocolRow>,
    media_kit: ListCache<MediaKitResourceRow>,
    scheduled: ListCache<ScheduledPostRow>,
}

impl Store {
    #[must_use]
    pub fn new(pool: PgPool, policy: FreshnessPolicy) -> Self {
        let cache = |kind: EntityKind| policy.window_for(kind);
        Self {
            profiles: ListCache::new(EntityKind::SocialProfile, cache(EntityKind::SocialProfile)),
            products: ListCache::new(EntityKind::Product, cache(EntityKind::Product)),
            posts: ListCache::new(EntityKind::SocialPost, cache(EntityKind::SocialPost)),
            launches: ListCache::new(EntityKind::Launch, cache(EntityKind::Launch)),
            phases: ListCache::new(EntityKind::LaunchPhase, cache(EntityKind::LaunchPhase)),
            protocols: ListCache::new(EntityKind::Protocol, cache(EntityKind::Protocol)),
            media_kit: ListCache::new(
                EntityKind::MediaKitResource,
                cache(EntityKind::MediaKitResource),
            ),
            scheduled: ListCache::new(EntityKind::ScheduledPost, cache(EntityKind::ScheduledPost)),
            pool,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the invalidation table for a mutated row of `kind` with the
    /// given parent references.
    async fn invalidate_parents(&self, kind: EntityKind, parents: &[(EntityKind, i64)]) {
        for (parent_kind, id) in parents {
            if !invalidation_targets(kind).contains(parent_kind) {
                continue;
            }
            match parent_kind {
                EntityKind::Launch => self.launches.invalidate_one(*id).await,
                EntityKind::SocialProfile => self.profiles.invalidate_one(*id).await,
                _ => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    /// Cached read of all profiles.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn profiles(&self) -> Result<Arc<Vec<ProfileRow>>, DbError> {
        let pool = &self.pool;
        self.profiles
            .read_with(Scope::All, || postline_db::list_profiles(pool, false))
            .await
    }

    /// Cached read of one profile.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn profile(&self, id: i64) -> Result<Option<Arc<ProfileRow>>, DbError> {
        let pool = &self.pool;
        self.profiles
            .read_one_with(id, || postline_db::get_profile(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert; the cache is untouched on
    /// failure.
    pub async fn create_profile(&self, input: &NewProfile) -> Result<ProfileRow, DbError> {
        let row = postline_db::create_profile(&self.pool, input).await?;
        self.profiles.apply_created(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`); the cache is untouched
    /// on failure.
    pub async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> Result<ProfileRow, DbError> {
        let row = postline_db::update_profile(&self.pool, id, patch).await?;
        self.profiles.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn apply_profile_metrics(
        &self,
        id: i64,
        metrics: &MetricsPatch,
    ) -> Result<ProfileRow, DbError> {
        let row = postline_db::update_profile_metrics(&self.pool, id, metrics).await?;
        self.profiles.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_profile(&self, id: i64) -> Result<(), DbError> {
        postline_db::delete_profile(&self.pool, id).await?;
        self.profiles.apply_removed(id).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    /// Cached read of all products.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn products(&self) -> Result<Arc<Vec<ProductRow>>, DbError> {
        let pool = &self.pool;
        self.products
            .read_with(Scope::All, || postline_db::list_products(pool))
            .await
    }

    /// Cached read of one product.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn product(&self, id: i64) -> Result<Option<Arc<ProductRow>>, DbError> {
        let pool = &self.pool;
        self.products
            .read_one_with(id, || postline_db::get_product(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_product(&self, input: &NewProduct) -> Result<ProductRow, DbError> {
        let row = postline_db::create_product(&self.pool, input).await?;
        self.products.apply_created(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<ProductRow, DbError> {
        let row = postline_db::update_product(&self.pool, id, patch).await?;
        self.products.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_product(&self, id: i64) -> Result<(), DbError> {
        postline_db::delete_product(&self.pool, id).await?;
        self.products.apply_removed(id).await;
        // Posts and launches hold detached references now.
        self.posts.invalidate_all().await;
        self.launches.invalidate_all().await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Cached read of posts under a scope. `Launch` and `Between` scopes map
    /// to server-side query filters; `Profile` and `Product` scopes narrow
    /// the full collection locally, since targeting lives in an array
    /// column.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn posts(&self, scope: Scope) -> Result<Arc<Vec<PostRow>>, DbError> {
        let pool = &self.pool;
        self.posts
            .read_with(scope, || async move {
                match scope {
                    Scope::All => postline_db::list_posts(pool, PostListFilters::default()).await,
                    Scope::Launch(id) => {
                        postline_db::list_posts(
                            pool,
                            PostListFilters {
                                launch_id: Some(id),
                                ..PostListFilters::default()
                            },
                        )
                        .await
                    }
                    Scope::Between(from, to) => {
                        postline_db::list_posts(
                            pool,
                            PostListFilters {
                                from: Some(from),
                                to: Some(to),
                                ..PostListFilters::default()
                            },
                        )
                        .await
                    }
                    Scope::Profile(id) => {
                        let rows =
                            postline_db::list_posts(pool, PostListFilters::default()).await?;
                        Ok(rows
                            .into_iter()
                            .filter(|row| row.profile_ids.contains(&id))
                            .collect())
                    }
                    Scope::Product(id) => {
                        let rows =
                            postline_db::list_posts(pool, PostListFilters::default()).await?;
                        Ok(rows
                            .into_iter()
                            .filter(|row| row.product_id == Some(id))
                            .collect())
                    }
                }
            })
            .await
    }

    /// Cached read of one post.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn post(&self, id: i64) -> Result<Option<Arc<PostRow>>, DbError> {
        let pool = &self.pool;
        self.posts
            .read_one_with(id, || postline_db::get_post(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_post(&self, input: &NewPost) -> Result<PostRow, DbError> {
        let row = postline_db::create_post(&self.pool, input).await?;
        self.posts.apply_created(row.clone()).await;
        if let Some(launch_id) = row.launch_id {
            self.invalidate_parents(EntityKind::SocialPost, &[(EntityKind::Launch, launch_id)])
                .await;
        }
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_post(&self, id: i64, patch: &PostPatch) -> Result<PostRow, DbError> {
        // The pre-image is needed so a launch the post moves away from is
        // invalidated too.
        let before = postline_db::get_post(&self.pool, id)
            .await?
            .ok_or(DbError::NotFound)?;

        let row = postline_db::update_post(&self.pool, id, patch).await?;
        self.posts.apply_updated(row.clone()).await;

        let mut parents = Vec::new();
        if let Some(launch_id) = before.launch_id {
            parents.push((EntityKind::Launch, launch_id));
        }
        if let Some(launch_id) = row.launch_id {
            if Some(launch_id) != before.launch_id {
                parents.push((EntityKind::Launch, launch_id));
            }
        }
        self.invalidate_parents(EntityKind::SocialPost, &parents).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_post(&self, id: i64) -> Result<(), DbError> {
        let before = postline_db::get_post(&self.pool, id)
            .await?
            .ok_or(DbError::NotFound)?;

        postline_db::delete_post(&self.pool, id).await?;
        self.posts.apply_removed(id).await;
        if let Some(launch_id) = before.launch_id {
            self.invalidate_parents(EntityKind::SocialPost, &[(EntityKind::Launch, launch_id)])
                .await;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Launches and phases
    // -----------------------------------------------------------------------

    /// Cached read of all launches.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn launches(&self) -> Result<Arc<Vec<LaunchRow>>, DbError> {
        let pool = &self.pool;
        self.launches
            .read_with(Scope::All, || postline_db::list_launches(pool))
            .await
    }

    /// Cached read of one launch.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn launch(&self, id: i64) -> Result<Option<Arc<LaunchRow>>, DbError> {
        let pool = &self.pool;
        self.launches
            .read_one_with(id, || postline_db::get_launch(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_launch(&self, input: &NewLaunch) -> Result<LaunchRow, DbError> {
        let row = postline_db::create_launch(&self.pool, input).await?;
        self.launches.apply_created(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_launch(&self, id: i64, patch: &LaunchPatch) -> Result<LaunchRow, DbError> {
        let row = postline_db::update_launch(&self.pool, id, patch).await?;
        self.launches.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// Deletes a launch; the schema cascades its phases and detaches its
    /// posts, so the phase lists for the launch and every post list that may
    /// hold a detached row are marked stale.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_launch(&self, id: i64) -> Result<(), DbError> {
        postline_db::delete_launch(&self.pool, id).await?;
        self.launches.apply_removed(id).await;
        self.phases.invalidate_scope(&Scope::Launch(id)).await;
        self.posts.invalidate_all().await;
        Ok(())
    }

    /// Cached read of a launch's phases.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn launch_phases(&self, launch_id: i64) -> Result<Arc<Vec<LaunchPhaseRow>>, DbError> {
        let pool = &self.pool;
        self.phases
            .read_with(Scope::Launch(launch_id), || {
                postline_db::list_launch_phases(pool, launch_id)
            })
            .await
    }

    /// Cached read of one phase.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn launch_phase(&self, id: i64) -> Result<Option<Arc<LaunchPhaseRow>>, DbError> {
        let pool = &self.pool;
        self.phases
            .read_one_with(id, || postline_db::get_launch_phase(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_launch_phase(
        &self,
        input: &NewLaunchPhase,
    ) -> Result<LaunchPhaseRow, DbError> {
        let row = postline_db::create_launch_phase(&self.pool, input).await?;
        self.phases.apply_created(row.clone()).await;
        self.invalidate_parents(EntityKind::LaunchPhase, &[(EntityKind::Launch, row.launch_id)])
            .await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_launch_phase(
        &self,
        id: i64,
        patch: &LaunchPhasePatch,
    ) -> Result<LaunchPhaseRow, DbError> {
        let row = postline_db::update_launch_phase(&self.pool, id, patch).await?;
        self.phases.apply_updated(row.clone()).await;
        self.invalidate_parents(EntityKind::LaunchPhase, &[(EntityKind::Launch, row.launch_id)])
            .await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_launch_phase(&self, id: i64) -> Result<(), DbError> {
        let before = postline_db::get_launch_phase(&self.pool, id)
            .await?
            .ok_or(DbError::NotFound)?;

        postline_db::delete_launch_phase(&self.pool, id).await?;
        self.phases.apply_removed(id).await;
        self.invalidate_parents(
            EntityKind::LaunchPhase,
            &[(EntityKind::Launch, before.launch_id)],
        )
        .await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Protocols
    // -----------------------------------------------------------------------

    /// Cached read of all protocols.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn protocols(&self) -> Result<Arc<Vec<ProtocolRow>>, DbError> {
        let pool = &self.pool;
        self.protocols
            .read_with(Scope::All, || postline_db::list_protocols(pool))
            .await
    }

    /// Cached read of one protocol.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn protocol(&self, id: i64) -> Result<Option<Arc<ProtocolRow>>, DbError> {
        let pool = &self.pool;
        self.protocols
            .read_one_with(id, || postline_db::get_protocol(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_protocol(&self, input: &NewProtocol) -> Result<ProtocolRow, DbError> {
        let row = postline_db::create_protocol(&self.pool, input).await?;
        self.protocols.apply_created(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_protocol(
        &self,
        id: i64,
        patch: &ProtocolPatch,
    ) -> Result<ProtocolRow, DbError> {
        let row = postline_db::update_protocol(&self.pool, id, patch).await?;
        self.protocols.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_protocol(&self, id: i64) -> Result<(), DbError> {
        postline_db::delete_protocol(&self.pool, id).await?;
        self.protocols.apply_removed(id).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Media kit
    // -----------------------------------------------------------------------

    /// Cached read of all media kit resources.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn media_kit_resources(&self) -> Result<Arc<Vec<MediaKitResourceRow>>, DbError> {
        let pool = &self.pool;
        self.media_kit
            .read_with(Scope::All, || postline_db::list_media_kit_resources(pool))
            .await
    }

    /// Cached read of one media kit resource.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn media_kit_resource(
        &self,
        id: i64,
    ) -> Result<Option<Arc<MediaKitResourceRow>>, DbError> {
        let pool = &self.pool;
        self.media_kit
            .read_one_with(id, || postline_db::get_media_kit_resource(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_media_kit_resource(
        &self,
        input: &NewMediaKitResource,
    ) -> Result<MediaKitResourceRow, DbError> {
        let row = postline_db::create_media_kit_resource(&self.pool, input).await?;
        self.media_kit.apply_created(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn update_media_kit_resource(
        &self,
        id: i64,
        patch: &MediaKitResourcePatch,
    ) -> Result<MediaKitResourceRow, DbError> {
        let row = postline_db::update_media_kit_resource(&self.pool, id, patch).await?;
        self.media_kit.apply_updated(row.clone()).await;
        Ok(row)
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_media_kit_resource(&self, id: i64) -> Result<(), DbError> {
        postline_db::delete_media_kit_resource(&self.pool, id).await?;
        self.media_kit.apply_removed(id).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Publish queue
    // -----------------------------------------------------------------------

    /// Cached read of queue rows, either all of them or one profile's.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn scheduled_posts(&self, scope: Scope) -> Result<Arc<Vec<ScheduledPostRow>>, DbError> {
        let pool = &self.pool;
        self.scheduled
            .read_with(scope, || async move {
                let filters = match scope {
                    Scope::Profile(id) => ScheduledPostFilters {
                        profile_id: Some(id),
                        ..ScheduledPostFilters::default()
                    },
                    _ => ScheduledPostFilters::default(),
                };
                postline_db::list_scheduled_posts(pool, filters).await
            })
            .await
    }

    /// Cached read of one queue row.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] from the underlying fetch.
    pub async fn scheduled_post(&self, id: i64) -> Result<Option<Arc<ScheduledPostRow>>, DbError> {
        let pool = &self.pool;
        self.scheduled
            .read_one_with(id, || postline_db::get_scheduled_post(pool, id))
            .await
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] from the insert.
    pub async fn create_scheduled_post(
        &self,
        input: &NewScheduledPost,
    ) -> Result<ScheduledPostRow, DbError> {
        let row = postline_db::create_scheduled_post(&self.pool, input).await?;
        self.scheduled.apply_created(row.clone()).await;
        self.invalidate_parents(
            EntityKind::ScheduledPost,
            &[(EntityKind::SocialProfile, row.profile_id)],
        )
        .await;
        Ok(row)
    }

    /// Record a successful dispatch and sync the cached row.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] (including `InvalidScheduleTransition`).
    pub async fn mark_scheduled_post_sent(&self, id: i64, external_id: &str) -> Result<(), DbError> {
        postline_db::mark_scheduled_post_sent(&self.pool, id, external_id).await?;
        self.refresh_scheduled_row(id).await
    }

    /// Record a failed dispatch and sync the cached row.
    ///
    /// # Errors
    ///
    /// Propagates [`DbError`] (including `InvalidScheduleTransition`).
    pub async fn mark_scheduled_post_failed(&self, id: i64, error: &str) -> Result<(), DbError> {
        postline_db::mark_scheduled_post_failed(&self.pool, id, error).await?;
        self.refresh_scheduled_row(id).await
    }

    async fn refresh_scheduled_row(&self, id: i64) -> Result<(), DbError> {
        if let Some(row) = postline_db::get_scheduled_post(&self.pool, id).await? {
            self.invalidate_parents(
                EntityKind::ScheduledPost,
                &[(EntityKind::SocialProfile, row.profile_id)],
            )
            .await;
            self.scheduled.apply_updated(row).await;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates [`DbError`] (including `NotFound`).
    pub async fn delete_scheduled_post(&self, id: i64) -> Result<(), DbError> {
        let before = postline_db::get_scheduled_post(&self.pool, id)
            .await?
            .ok_or(DbError::NotFound)?;

        postline_db::delete_scheduled_post(&self.pool, id).await?;
        self.scheduled.apply_removed(id).await;
        self.invalidate_parents(
            EntityKind::ScheduledPost,
            &[(EntityKind::SocialProfile, before.profile_id)],
        )
        .await;
        Ok(())
    }
}
