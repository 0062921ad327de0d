//! [`CacheRecord`] implementations for the data-access row types.
//!
//! Order keys mirror each list query's `ORDER BY`; scope membership mirrors
//! its `WHERE` clause. If a query changes, its impl here changes with it.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};

use postline_db::{
    LaunchPhaseRow, LaunchRow, MediaKitResourceRow, PostRow, ProductRow, ProfileRow, ProtocolRow,
    ScheduledPostRow,
};

use crate::key::Scope;
use crate::list_cache::CacheRecord;

impl CacheRecord for ProfileRow {
    type OrderKey = (String, i64);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.display_name.clone(), self.id)
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        matches!(scope, Scope::All)
    }
}

impl CacheRecord for ProductRow {
    type OrderKey = (Reverse<DateTime<Utc>>, Reverse<i64>);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (Reverse(self.created_at), Reverse(self.id))
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        matches!(scope, Scope::All)
    }
}

impl CacheRecord for PostRow {
    type OrderKey = (DateTime<Utc>, i64);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.post_at, self.id)
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Launch(id) => self.launch_id == Some(*id),
            Scope::Profile(id) => self.profile_ids.contains(id),
            Scope::Product(id) => self.product_id == Some(*id),
            Scope::Between(start, end) => *start <= self.post_at && self.post_at <= *end,
        }
    }
}

impl CacheRecord for LaunchRow {
    type OrderKey = (Reverse<DateTime<Utc>>, Reverse<i64>);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (Reverse(self.created_at), Reverse(self.id))
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Product(id) => self.product_id == Some(*id),
            _ => false,
        }
    }
}

impl CacheRecord for LaunchPhaseRow {
    // NULL start dates sort last, matching the query's NULLS LAST.
    type OrderKey = (bool, Option<NaiveDate>, i64);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.start_date.is_none(), self.start_date, self.id)
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Launch(id) => self.launch_id == *id,
            _ => false,
        }
    }
}

impl CacheRecord for ProtocolRow {
    type OrderKey = (Reverse<DateTime<Utc>>, Reverse<i64>);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (Reverse(self.created_at), Reverse(self.id))
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        matches!(scope, Scope::All)
    }
}

impl CacheRecord for MediaKitResourceRow {
    type OrderKey = (Reverse<DateTime<Utc>>, Reverse<i64>);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (Reverse(self.created_at), Reverse(self.id))
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        matches!(scope, Scope::All)
    }
}

impl CacheRecord for ScheduledPostRow {
    type OrderKey = (DateTime<Utc>, i64);

    fn cache_id(&self) -> i64 {
        self.id
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.scheduled_for, self.id)
    }

    fn matches_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Profile(id) => self.profile_id == *id,
            _ => false,
        }
    }
}
