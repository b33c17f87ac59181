use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Row id as issued by the backing store.
pub type Id = i64;

/// Platform identifier. Platform lists are compared as sets.
pub type PlatformId = i64;

/// A side of the facility (e.g. north/south). The UI addresses sides by `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub id: Id,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fallback capacity/platforms for a period type, optionally per side.
/// `side_id == None` is the global default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTypeDefault {
    pub id: Id,
    pub period_type_id: Id,
    #[serde(default)]
    pub side_id: Option<Id>,
    pub default_capacity: u32,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformId>>,
}

impl PeriodTypeDefault {
    pub fn values(&self) -> DefaultValues {
        DefaultValues {
            capacity: self.default_capacity,
            platforms: self.platforms.clone(),
        }
    }
}

/// A weekly capacity window for a period type on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySchedule {
    pub id: Id,
    pub period_type_id: Id,
    #[serde(default)]
    pub side_id: Option<Id>,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformId>>,
}

/// Date-specific exception to the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTypeOverride {
    pub id: Id,
    pub date: NaiveDate,
    pub period_type_id: Id,
    pub capacity: u32,
    #[serde(default)]
    pub notes: Option<String>,
    /// Lookup only. Removing the override leaves the booking alone.
    #[serde(default)]
    pub booking_id: Option<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Single,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl RecurrenceType {
    pub fn is_recurring(self) -> bool {
        !matches!(self, RecurrenceType::Single)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Id,
    pub title: String,
    pub recurrence_type: RecurrenceType,
    pub starts_on: NaiveDate,
}

/// One occurrence of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInstance {
    pub id: Id,
    pub booking_id: Id,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The comparable part of a default: what schedule entries inherit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValues {
    pub capacity: u32,
    pub platforms: Option<Vec<PlatformId>>,
}

// ── Request types ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDefault {
    pub period_type_id: Id,
    /// `None` saves the global default.
    pub side_key: Option<String>,
    pub capacity: u32,
    pub platforms: Vec<PlatformId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOverride {
    pub date: NaiveDate,
    pub period_type_id: Id,
    pub capacity: u32,
    pub notes: Option<String>,
    pub booking_id: Option<Id>,
}

/// Partial update of an override. `Some(None)` clears an optional column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverridePatch {
    pub date: Option<NaiveDate>,
    pub capacity: Option<u32>,
    pub notes: Option<Option<String>>,
    pub booking_id: Option<Option<Id>>,
}

impl OverridePatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.capacity.is_none() && self.notes.is_none() && self.booking_id.is_none()
    }
}

/// Partial update applied to every instance an edit scope targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePatch {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<Option<u32>>,
    pub notes: Option<Option<String>>,
}

impl InstancePatch {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none()
            && self.end_time.is_none()
            && self.capacity.is_none()
            && self.notes.is_none()
    }
}

// ── Outcome types ────────────────────────────────────────────────

/// Result of the best-effort follow-up after a default is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// No prior default, or nothing was inheriting it.
    NotNeeded,
    Migrated(Vec<Id>),
    /// The default is saved; schedule propagation failed and needs a retry.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDefaultOutcome {
    pub default: PeriodTypeDefault,
    pub reconciliation: ReconcileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub booking_id: Id,
    pub deleted_instances: Vec<Id>,
    pub parent_deleted: bool,
}

/// Where a snapshot window's capacity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacitySource {
    Schedule(Id),
    Override(Id),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotWindow {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
    pub platforms: Vec<PlatformId>,
    pub source: CapacitySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub date: NaiveDate,
    pub period_type_id: Id,
    pub side_id: Option<Id>,
    pub windows: Vec<SnapshotWindow>,
    /// Live default, reported when no schedule window exists for the day.
    pub fallback: Option<DefaultValues>,
}
