use serde_json::Value;

use crate::model::{CapacitySchedule, DefaultValues, Id, PlatformId};
use crate::platforms::{normalize, same_platforms, to_stored};
use crate::store::Patch;

/// Schedule entries to move onto a new default, and the values they get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Ascending, no duplicates.
    pub schedule_ids: Vec<Id>,
    pub capacity: u32,
    /// `None` when the new platform set is empty.
    pub platforms: Option<Vec<PlatformId>>,
}

impl Migration {
    pub fn is_empty(&self) -> bool {
        self.schedule_ids.is_empty()
    }

    /// The single batch update applied to every migrated entry.
    pub fn patch(&self) -> Patch {
        let mut patch = Patch::new();
        patch.insert("capacity".into(), Value::from(self.capacity));
        patch.insert(
            "platforms".into(),
            match &self.platforms {
                Some(p) => Value::from(p.clone()),
                None => Value::Null,
            },
        );
        patch
    }
}

/// An entry inherits a default when it still carries exactly the default's
/// capacity and platform set.
pub fn inherits(default: &DefaultValues, entry: &CapacitySchedule) -> bool {
    entry.capacity == default.capacity
        && same_platforms(entry.platforms.as_deref(), default.platforms.as_deref())
}

/// Pick the entries still inheriting `old` so they follow the change to
/// `new`. Customized entries are never selected. With no prior default
/// nothing was inheriting, so nothing migrates.
pub fn reconcile_default(
    old: Option<&DefaultValues>,
    new: &DefaultValues,
    candidates: &[CapacitySchedule],
) -> Migration {
    let mut schedule_ids: Vec<Id> = match old {
        Some(old) => candidates
            .iter()
            .filter(|c| inherits(old, c))
            .map(|c| c.id)
            .collect(),
        None => Vec::new(),
    };
    schedule_ids.sort_unstable();
    schedule_ids.dedup();

    let platforms = new
        .platforms
        .as_deref()
        .and_then(to_stored);

    Migration {
        schedule_ids,
        capacity: new.capacity,
        platforms,
    }
}

/// True when saving `new` over `old` cannot change any inheriting entry.
pub fn is_noop(old: Option<&DefaultValues>, new: &DefaultValues) -> bool {
    match old {
        None => true,
        Some(old) => {
            old.capacity == new.capacity
                && normalize(old.platforms.as_deref()) == normalize(new.platforms.as_deref())
        }
    }
}
