//! Generic per-entity cache machinery.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use postline_db::DbError;

use crate::coalesce::InflightGate;
use crate::key::{EntityKind, Scope};

/// What the cache needs to know about a row: identity, list position, and
/// which scopes logically contain it.
pub trait CacheRecord: Clone + Send + Sync + 'static {
    /// Lists are kept ascending by this key; wrap fields in
    /// [`std::cmp::Reverse`] for newest-first collections.
    type OrderKey: Ord;

    fn cache_id(&self) -> i64;
    fn order_key(&self) -> Self::OrderKey;
    fn matches_scope(&self, scope: &Scope) -> bool;
}

struct ListEntry<T> {
    rows: Arc<Vec<T>>,
    fetched_at: Instant,
}

struct OneEntry<T> {
    row: Arc<T>,
    fetched_at: Instant,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum GateKey {
    List(Scope),
    One(i64),
}

/// Freshness-windowed, write-through cache for one entity's collections.
///
/// Reads inside the window are served from memory; stale reads coalesce per
/// key so concurrent callers trigger one fetch. Mutation hooks patch every
/// cached list in place without refreshing the window — a patched entry is
/// exactly as fresh as its last fetch. A failed fetch leaves prior state
/// untouched.
pub struct ListCache<T> {
    entity: EntityKind,
    ttl: Duration,
    lists: Mutex<HashMap<Scope, ListEntry<T>>>,
    ones: Mutex<HashMap<i64, OneEntry<T>>>,
    gate: InflightGate<GateKey>,
}

impl<T: CacheRecord> ListCache<T> {
    #[must_use]
    pub fn new(entity: EntityKind, ttl: Duration) -> Self {
        Self {
            entity,
            ttl,
            lists: Mutex::new(HashMap::new()),
            ones: Mutex::new(HashMap::new()),
            gate: InflightGate::new(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Read the list for `scope`, fetching through `fetch` when the cached
    /// value is missing or older than the freshness window.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; the cache is left untouched.
    pub async fn read_with<F, Fut>(&self, scope: Scope, fetch: F) -> Result<Arc<Vec<T>>, DbError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, DbError>>,
    {
        if let Some(rows) = self.fresh_list(&scope).await {
            return Ok(rows);
        }

        let _guard = self.gate.acquire(&GateKey::List(scope)).await;
        // A coalesced waiter finds the entry the leader just stored.
        if let Some(rows) = self.fresh_list(&scope).await {
            return Ok(rows);
        }

        let rows = Arc::new(fetch().await?);
        self.lists.lock().await.insert(
            scope,
            ListEntry {
                rows: Arc::clone(&rows),
                fetched_at: Instant::now(),
            },
        );
        Ok(rows)
    }

    /// Read a single record by id with the same freshness/coalescing rules.
    /// An absent record is not cached; every miss re-asks the store.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; the cache is left untouched.
    pub async fn read_one_with<F, Fut>(&self, id: i64, fetch: F) -> Result<Option<Arc<T>>, DbError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, DbError>>,
    {
        if let Some(row) = self.fresh_one(id).await {
            return Ok(Some(row));
        }

        let _guard = self.gate.acquire(&GateKey::One(id)).await;
        if let Some(row) = self.fresh_one(id).await {
            return Ok(Some(row));
        }

        match fetch().await? {
            Some(row) => {
                let row = Arc::new(row);
                self.ones.lock().await.insert(
                    id,
                    OneEntry {
                        row: Arc::clone(&row),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn fresh_list(&self, scope: &Scope) -> Option<Arc<Vec<T>>> {
        let lists = self.lists.lock().await;
        lists
            .get(scope)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.rows))
    }

    async fn fresh_one(&self, id: i64) -> Option<Arc<T>> {
        let ones = self.ones.lock().await;
        ones.get(&id)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.row))
    }

    /// A row was created: insert it, in order, into every cached list whose
    /// scope contains it, and prime the single-record cache.
    pub async fn apply_created(&self, row: T) {
        let mut lists = self.lists.lock().await;
        for (scope, entry) in lists.iter_mut() {
            if row.matches_scope(scope) {
                let mut rows = entry.rows.as_ref().clone();
                insert_sorted(&mut rows, row.clone());
                entry.rows = Arc::new(rows);
            }
        }
        drop(lists);

        self.ones.lock().await.insert(
            row.cache_id(),
            OneEntry {
                row: Arc::new(row),
                fetched_at: Instant::now(),
            },
        );
    }

    /// A row was updated: replace it in every list that holds it, insert it
    /// into lists whose scope it moved into, and drop it from lists whose
    /// scope it left.
    pub async fn apply_updated(&self, row: T) {
        let id = row.cache_id();
        let mut lists = self.lists.lock().await;
        for (scope, entry) in lists.iter_mut() {
            let present = entry.rows.iter().any(|r| r.cache_id() == id);
            let wanted = row.matches_scope(scope);
            if !present && !wanted {
                continue;
            }
            let mut rows = entry.rows.as_ref().clone();
            rows.retain(|r| r.cache_id() != id);
            if wanted {
                insert_sorted(&mut rows, row.clone());
            }
            entry.rows = Arc::new(rows);
        }
        drop(lists);

        self.ones.lock().await.insert(
            id,
            OneEntry {
                row: Arc::new(row),
                fetched_at: Instant::now(),
            },
        );
    }

    /// A row was deleted: drop it everywhere.
    pub async fn apply_removed(&self, id: i64) {
        let mut lists = self.lists.lock().await;
        for entry in lists.values_mut() {
            if entry.rows.iter().any(|r| r.cache_id() == id) {
                let mut rows = entry.rows.as_ref().clone();
                rows.retain(|r| r.cache_id() != id);
                entry.rows = Arc::new(rows);
            }
        }
        drop(lists);

        self.ones.lock().await.remove(&id);
    }

    /// Mark one scope stale, forcing the next read to refetch.
    pub async fn invalidate_scope(&self, scope: &Scope) {
        self.lists.lock().await.remove(scope);
    }

    /// Mark one record stale.
    pub async fn invalidate_one(&self, id: i64) {
        self.ones.lock().await.remove(&id);
    }

    /// Mark everything stale.
    pub async fn invalidate_all(&self) {
        self.lists.lock().await.clear();
        self.ones.lock().await.clear();
    }
}

fn insert_sorted<T: CacheRecord>(rows: &mut Vec<T>, row: T) {
    let key = row.order_key();
    let position = rows.partition_point(|r| r.order_key() <= key);
    rows.insert(position, row);
}
