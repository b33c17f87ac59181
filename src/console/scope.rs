use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::limits::MAX_INSTANCE_SELECTION;
use crate::model::{BookingInstance, Id, RecurrenceType};

use super::ConsoleError;

/// How much of a recurring series an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    /// This occurrence only.
    Single,
    /// This occurrence and every later one.
    Future,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesInfo {
    pub recurrence_type: RecurrenceType,
    pub occurrence_date: NaiveDate,
}

impl SeriesInfo {
    pub fn new(recurrence_type: RecurrenceType, occurrence_date: NaiveDate) -> Self {
        Self {
            recurrence_type,
            occurrence_date,
        }
    }

    /// Scopes the dialog may offer. Single bookings only have one occurrence.
    pub fn available_scopes(&self) -> &'static [EditScope] {
        if self.recurrence_type.is_recurring() {
            &[EditScope::Single, EditScope::Future, EditScope::All]
        } else {
            &[EditScope::Single]
        }
    }

    pub fn allows(&self, scope: EditScope) -> bool {
        self.available_scopes().contains(&scope)
    }
}

/// The scope that actually applies: anything wider than `Single` on a
/// non-recurring booking falls back to `Single`.
pub fn resolve_scope(series: &SeriesInfo, requested: EditScope) -> EditScope {
    if series.allows(requested) {
        requested
    } else {
        EditScope::Single
    }
}

/// A confirmed scope for one occurrence. Cannot hold `Future` or `All` for a
/// non-recurring booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeSelection {
    series: SeriesInfo,
    scope: EditScope,
}

impl ScopeSelection {
    pub fn try_new(series: SeriesInfo, scope: EditScope) -> Result<Self, ConsoleError> {
        if !series.allows(scope) {
            return Err(ConsoleError::ScopeUnavailable {
                recurrence: series.recurrence_type,
                scope,
            });
        }
        Ok(Self { series, scope })
    }

    pub fn resolve(series: SeriesInfo, requested: EditScope) -> Self {
        Self {
            series,
            scope: resolve_scope(&series, requested),
        }
    }

    pub fn scope(&self) -> EditScope {
        self.scope
    }

    pub fn series(&self) -> &SeriesInfo {
        &self.series
    }

    pub fn includes(&self, date: NaiveDate) -> bool {
        match self.scope {
            EditScope::Single => date == self.series.occurrence_date,
            EditScope::Future => date >= self.series.occurrence_date,
            EditScope::All => true,
        }
    }

    /// Ids of the instances this selection covers, in input order.
    pub fn targets(&self, instances: &[BookingInstance]) -> Vec<Id> {
        instances
            .iter()
            .filter(|i| self.includes(i.date))
            .map(|i| i.id)
            .collect()
    }
}

/// Edit/delete mode selector. Starts at `Single`; `confirm` and `cancel`
/// consume it.
#[derive(Debug, Clone)]
pub struct ScopeDialog {
    series: SeriesInfo,
    selected: EditScope,
}

impl ScopeDialog {
    pub fn open(series: SeriesInfo) -> Self {
        Self {
            series,
            selected: EditScope::Single,
        }
    }

    pub fn options(&self) -> &'static [EditScope] {
        self.series.available_scopes()
    }

    pub fn selected(&self) -> EditScope {
        self.selected
    }

    /// Returns false and falls back to `Single` when `scope` is not offered.
    pub fn select(&mut self, scope: EditScope) -> bool {
        if self.series.allows(scope) {
            self.selected = scope;
            true
        } else {
            self.selected = EditScope::Single;
            false
        }
    }

    pub fn confirm(self) -> ScopeSelection {
        ScopeSelection {
            series: self.series,
            scope: self.selected,
        }
    }

    pub fn cancel(self) {}
}

// ── Delete targets ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    /// Instances ticked in the instance list.
    Selected(Vec<Id>),
    /// The whole booking.
    Series,
    /// Occurrences covered by a confirmed scope.
    Scoped(ScopeSelection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceTargets {
    Ids(Vec<Id>),
    Scoped(ScopeSelection),
    AllOfBooking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentDeletion {
    /// Delete the booking once it has no instances left.
    IfEmpty,
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub booking_id: Id,
    pub instances: InstanceTargets,
    pub parent: ParentDeletion,
}

pub fn resolve_delete_targets(booking_id: Id, request: DeleteRequest) -> Result<DeletePlan, ConsoleError> {
    let (instances, parent) = match request {
        DeleteRequest::Selected(mut ids) => {
            if ids.is_empty() {
                return Err(ConsoleError::EmptySelection);
            }
            if ids.len() > MAX_INSTANCE_SELECTION {
                return Err(ConsoleError::LimitExceeded("too many instances selected"));
            }
            ids.sort_unstable();
            ids.dedup();
            (InstanceTargets::Ids(ids), ParentDeletion::IfEmpty)
        }
        DeleteRequest::Series => (InstanceTargets::AllOfBooking, ParentDeletion::Always),
        DeleteRequest::Scoped(selection) if selection.scope() == EditScope::All => {
            (InstanceTargets::AllOfBooking, ParentDeletion::Always)
        }
        DeleteRequest::Scoped(selection) => (InstanceTargets::Scoped(selection), ParentDeletion::IfEmpty),
    };
    Ok(DeletePlan {
        booking_id,
        instances,
        parent,
    })
}

/// A booking with no instances left is an orphan.
pub fn parent_orphaned(remaining_instances: usize) -> bool {
    remaining_instances == 0
}

impl DeletePlan {
    pub fn deletes_parent(&self, remaining_instances: usize) -> bool {
        match self.parent {
            ParentDeletion::Always => true,
            ParentDeletion::IfEmpty => parent_orphaned(remaining_instances),
        }
    }
}
