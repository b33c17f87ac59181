use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::Id;
use crate::notify::Change;

pub const BOOKING_INFO: &str = "booking-info";
pub const BOOKING_INSTANCES: &str = "booking-instances";
pub const BOOKING_SERIES: &str = "booking-series";
pub const SNAPSHOT: &str = "snapshot";

/// Query-cache key constructors, `<view>:<scope>`.
pub struct CacheKey;

impl CacheKey {
    pub fn booking_info(booking_id: Id) -> String {
        format!("{BOOKING_INFO}:{booking_id}")
    }

    pub fn booking_instances(booking_id: Id) -> String {
        format!("{BOOKING_INSTANCES}:{booking_id}")
    }

    pub fn booking_series(scope: &str) -> String {
        format!("{BOOKING_SERIES}:{scope}")
    }

    pub fn snapshot(scope: &str) -> String {
        format!("{SNAPSHOT}:{scope}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Exact(String),
    /// Every key starting with the prefix. Aggregate views are cached under
    /// many scopes that share one prefix.
    Prefix(&'static str),
}

impl Invalidation {
    pub fn covers(&self, key: &str) -> bool {
        match self {
            Invalidation::Exact(k) => k == key,
            Invalidation::Prefix(p) => key.starts_with(p),
        }
    }
}

fn booking_views(booking_id: Id) -> Vec<Invalidation> {
    vec![
        Invalidation::Exact(CacheKey::booking_info(booking_id)),
        Invalidation::Exact(CacheKey::booking_instances(booking_id)),
        Invalidation::Prefix(BOOKING_SERIES),
        Invalidation::Prefix(SNAPSHOT),
    ]
}

/// Which cached views a change makes stale.
pub fn invalidations_for(change: &Change) -> Vec<Invalidation> {
    match change {
        Change::BookingInstancesUpdated { booking_id, .. }
        | Change::BookingInstancesDeleted { booking_id, .. }
        | Change::BookingDeleted { booking_id } => booking_views(*booking_id),
        Change::OverrideCreated { booking_id, .. }
        | Change::OverrideUpdated { booking_id, .. }
        | Change::OverrideDeleted { booking_id, .. } => {
            let mut out = vec![Invalidation::Prefix(SNAPSHOT)];
            if let Some(b) = booking_id {
                out.push(Invalidation::Exact(CacheKey::booking_info(*b)));
            }
            out
        }
        Change::DefaultSaved { .. } | Change::SchedulesMigrated { .. } => {
            vec![Invalidation::Prefix(SNAPSHOT)]
        }
    }
}

/// Cached query results keyed by view.
pub struct QueryCache {
    entries: DashMap<String, Value>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn apply(&self, invalidation: &Invalidation) {
        match invalidation {
            Invalidation::Exact(key) => {
                self.entries.remove(key);
            }
            Invalidation::Prefix(_) => self.entries.retain(|k, _| !invalidation.covers(k)),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Background task applying invalidations for every published change.
/// Returns when the hub is dropped.
pub async fn run_invalidator(cache: Arc<QueryCache>, mut changes: broadcast::Receiver<Change>) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                for inv in invalidations_for(&change) {
                    debug!("invalidate {inv:?}");
                    cache.apply(&inv);
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                // Missed changes could have touched anything.
                warn!("cache invalidator lagged by {missed} changes, clearing cache");
                cache.clear();
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
