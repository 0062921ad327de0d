//! Derived view state: calendar bucketing and list filtering.
//!
//! Pure functions over already-fetched collections. The same [`DateRange`]
//! backs both the remote date-scoped query and the local month-view
//! recomputation, so the two cannot disagree on inclusivity.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::composer::ProfileRef;
use crate::error::ValidationError;
use crate::platform::Platform;
use crate::status::{ContentType, PostStatus};

/// A timestamp range, inclusive on both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDateRange`] when `end` precedes
    /// `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::EmptyDateRange);
        }
        Ok(Self { start, end })
    }

    /// The full given month: midnight on the first day through the last
    /// instant before the next month. `None` for an invalid year/month.
    #[must_use]
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?);
        let end = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?) - Duration::nanoseconds(1);
        Some(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// One calendar day's slice of a collection.
#[derive(Debug)]
pub struct DayBucket<'a, T> {
    pub date: NaiveDate,
    pub items: Vec<&'a T>,
}

/// Bucket items by UTC calendar date across every day of the range.
///
/// Date equality is evaluated in UTC, so an item at `23:59Z` lands on its
/// own day regardless of whatever offset a caller renders with. Days with
/// no items still appear, empty, which is what a calendar grid wants.
pub fn day_buckets<'a, T, F>(range: &DateRange, items: &'a [T], at: F) -> Vec<DayBucket<'a, T>>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut buckets = Vec::new();
    let mut day = range.start.date_naive();
    let last = range.end.date_naive();
    while day <= last {
        let matching = items
            .iter()
            .filter(|item| {
                let when = at(item);
                range.contains(when) && when.date_naive() == day
            })
            .collect();
        buckets.push(DayBucket { date: day, items: matching });
        day = day + Duration::days(1);
    }
    buckets
}

/// Conjunctive post filter: a post passes iff every set dimension matches.
/// An unset dimension matches everything.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub profile_id: Option<i64>,
    pub status: Option<PostStatus>,
    pub content_type: Option<ContentType>,
    pub platform: Option<Platform>,
}

impl PostFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile_id.is_none()
            && self.status.is_none()
            && self.content_type.is_none()
            && self.platform.is_none()
    }

    /// Evaluate the filter against one post's facts. The platform dimension
    /// resolves the post's profiles through `profiles` and matches when any
    /// targeted profile is on the wanted platform. `status`/`content_type`
    /// are `None` when the stored value did not parse; an unknown value
    /// fails any set dimension.
    #[must_use]
    pub fn matches(
        &self,
        status: Option<PostStatus>,
        content_type: Option<ContentType>,
        profile_ids: &[i64],
        profiles: &[ProfileRef],
    ) -> bool {
        if let Some(wanted) = self.profile_id {
            if !profile_ids.contains(&wanted) {
                return false;
            }
        }
        if let Some(wanted) = self.status {
            if status != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = self.content_type {
            if content_type != Some(wanted) {
                return false;
            }
        }
        if let Some(ref wanted) = self.platform {
            let on_platform = profile_ids.iter().any(|id| {
                profiles
                    .iter()
                    .any(|p| p.id == *id && p.platform == *wanted)
            });
            if !on_platform {
                return false;
            }
        }
        true
    }
}
