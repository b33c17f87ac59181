mod bookings;
mod defaults;
mod error;
mod overrides;
pub mod reconcile;
pub mod scope;
mod snapshot;
#[cfg(test)]
mod tests;

pub use error::ConsoleError;
pub use reconcile::{inherits, reconcile_default, Migration};
pub use scope::{
    parent_orphaned, resolve_delete_targets, resolve_scope, DeletePlan, DeleteRequest, EditScope,
    InstanceTargets, ParentDeletion, ScopeDialog, ScopeSelection, SeriesInfo,
};

use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::limits::*;
use crate::model::*;
use crate::notify::{Change, ChangeHub};
use crate::store::{fetch_one, Filter, Instrumented, Store, Table};

/// Runs console actions against the store. Each action is one sequential
/// chain of store calls; nothing here locks or retries.
pub struct Console {
    store: Arc<dyn Store>,
    pub notify: Arc<ChangeHub>,
}

impl Console {
    pub fn new(store: Arc<dyn Store>, notify: Arc<ChangeHub>) -> Self {
        Self {
            store: Arc::new(Instrumented::new(store)),
            notify,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &ConsoleConfig) -> Self {
        Self::new(
            store,
            Arc::new(ChangeHub::with_capacity(config.change_channel_capacity)),
        )
    }

    fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn publish(&self, change: Change) {
        self.notify.publish(change);
    }

    /// Map a side key from the UI to its row id. `None` is the global scope.
    pub async fn resolve_side(&self, side_key: Option<&str>) -> Result<Option<Id>, ConsoleError> {
        let Some(key) = side_key else { return Ok(None) };
        if key.len() > MAX_SIDE_KEY_LEN {
            return Err(ConsoleError::LimitExceeded("side key too long"));
        }
        let side: Option<Side> = fetch_one(self.store(), Table::Sides, &Filter::new().eq("key", key)).await?;
        side.map(|s| Some(s.id))
            .ok_or_else(|| ConsoleError::UnresolvedSide(key.to_string()))
    }
}

pub(crate) fn validate_capacity(capacity: u32) -> Result<(), ConsoleError> {
    if capacity > MAX_CAPACITY {
        return Err(ConsoleError::LimitExceeded("capacity too large"));
    }
    Ok(())
}

pub(crate) fn validate_platforms(platforms: &[PlatformId]) -> Result<(), ConsoleError> {
    if platforms.len() > MAX_PLATFORMS {
        return Err(ConsoleError::LimitExceeded("too many platforms"));
    }
    Ok(())
}

pub(crate) fn validate_notes(notes: Option<&str>) -> Result<(), ConsoleError> {
    if notes.is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        return Err(ConsoleError::LimitExceeded("notes too long"));
    }
    Ok(())
}
