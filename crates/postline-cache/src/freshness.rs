//! Per-entity freshness windows.
//!
//! Windows track entity volatility, not correctness: posts are edited all
//! day, the media kit changes a few times a quarter. Values are tunable via
//! configuration; tests inject zero windows to force the refetch path.

use std::time::Duration;

use postline_core::AppConfig;

use crate::key::EntityKind;

const VOLATILE_TTL_SECS: u64 = 120;
const STANDARD_TTL_SECS: u64 = 300;
const STATIC_TTL_SECS: u64 = 900;

#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub volatile: Duration,
    pub standard: Duration,
    pub stable: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            volatile: Duration::from_secs(VOLATILE_TTL_SECS),
            standard: Duration::from_secs(STANDARD_TTL_SECS),
            stable: Duration::from_secs(STATIC_TTL_SECS),
        }
    }
}

impl FreshnessPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            volatile: Duration::from_secs(config.cache_volatile_ttl_secs),
            standard: Duration::from_secs(config.cache_standard_ttl_secs),
            stable: Duration::from_secs(config.cache_static_ttl_secs),
        }
    }

    /// Zero windows everywhere: every read refetches. For tests.
    #[must_use]
    pub fn always_stale() -> Self {
        Self {
            volatile: Duration::ZERO,
            standard: Duration::ZERO,
            stable: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn window_for(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::SocialPost | EntityKind::ScheduledPost => self.volatile,
            EntityKind::SocialProfile | EntityKind::Launch | EntityKind::LaunchPhase => {
                self.standard
            }
            EntityKind::Product | EntityKind::Protocol | EntityKind::MediaKitResource => {
                self.stable
            }
        }
    }
}
