//! Cache addressing: entity kinds, scopes, and the invalidation table.

use chrono::{DateTime, Utc};

/// The entity a cache key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    SocialProfile,
    Product,
    SocialPost,
    Launch,
    LaunchPhase,
    Protocol,
    MediaKitResource,
    ScheduledPost,
}

/// Which slice of an entity's collection a cached list holds.
///
/// `Between` bounds are inclusive on both ends, matching the data-access
/// layer's date-range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Launch(i64),
    Profile(i64),
    Product(i64),
    Between(DateTime<Utc>, DateTime<Utc>),
}

/// Full address of one cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity: EntityKind,
    pub scope: Scope,
}

impl CacheKey {
    #[must_use]
    pub fn new(entity: EntityKind, scope: Scope) -> Self {
        Self { entity, scope }
    }
}

/// Parent entities whose caches go stale when a row of `kind` mutates.
///
/// The table is the single place this knowledge lives; mutation paths apply
/// it mechanically rather than invalidating ad hoc.
#[must_use]
pub fn invalidation_targets(kind: EntityKind) -> &'static [EntityKind] {
    match kind {
        EntityKind::SocialPost | EntityKind::LaunchPhase => &[EntityKind::Launch],
        EntityKind::ScheduledPost => &[EntityKind::SocialProfile],
        EntityKind::SocialProfile
        | EntityKind::Product
        | EntityKind::Launch
        | EntityKind::Protocol
        | EntityKind::MediaKitResource => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_equal_parts_are_equal() {
        let a = CacheKey::new(EntityKind::SocialPost, Scope::Launch(3));
        let b = CacheKey::new(EntityKind::SocialPost, Scope::Launch(3));
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new(EntityKind::SocialPost, Scope::Launch(4)));
        assert_ne!(a, CacheKey::new(EntityKind::LaunchPhase, Scope::Launch(3)));
    }

    #[test]
    fn posts_and_phases_invalidate_their_launch() {
        assert_eq!(
            invalidation_targets(EntityKind::SocialPost),
            &[EntityKind::Launch]
        );
        assert_eq!(
            invalidation_targets(EntityKind::LaunchPhase),
            &[EntityKind::Launch]
        );
    }

    #[test]
    fn queue_rows_invalidate_their_profile() {
        assert_eq!(
            invalidation_targets(EntityKind::ScheduledPost),
            &[EntityKind::SocialProfile]
        );
    }

    #[test]
    fn root_entities_invalidate_nothing() {
        assert!(invalidation_targets(EntityKind::Product).is_empty());
        assert!(invalidation_targets(EntityKind::Launch).is_empty());
    }
}
