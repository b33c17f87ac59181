use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::limits::MAX_OVERRIDE_RANGE_DAYS;
use crate::model::*;
use crate::notify::Change;
use crate::observability::OVERRIDE_MUTATIONS_TOTAL;
use crate::store::{fetch, fetch_one, insert_as, to_row, Filter, OrderBy, Patch, Table};

use super::{validate_capacity, validate_notes, Console, ConsoleError};

#[derive(Serialize)]
struct OverrideRow<'a> {
    date: NaiveDate,
    period_type_id: Id,
    capacity: u32,
    notes: Option<&'a str>,
    booking_id: Option<Id>,
}

fn override_patch(patch: &OverridePatch) -> Patch {
    let mut out = Patch::new();
    if let Some(date) = patch.date {
        out.insert("date".into(), Value::from(date.to_string()));
    }
    if let Some(capacity) = patch.capacity {
        out.insert("capacity".into(), Value::from(capacity));
    }
    if let Some(notes) = &patch.notes {
        out.insert("notes".into(), notes.clone().map_or(Value::Null, Value::from));
    }
    if let Some(booking_id) = patch.booking_id {
        out.insert("booking_id".into(), booking_id.map_or(Value::Null, Value::from));
    }
    out
}

impl Console {
    pub async fn override_by_id(&self, id: Id) -> Result<PeriodTypeOverride, ConsoleError> {
        fetch_one(self.store(), Table::PeriodTypeOverrides, &Filter::new().eq("id", id))
            .await?
            .ok_or(ConsoleError::NotFound {
                table: Table::PeriodTypeOverrides,
                id,
            })
    }

    pub async fn override_on(
        &self,
        date: NaiveDate,
        period_type_id: Id,
    ) -> Result<Option<PeriodTypeOverride>, ConsoleError> {
        let filter = Filter::new()
            .eq("date", date.to_string())
            .eq("period_type_id", period_type_id);
        Ok(fetch_one(self.store(), Table::PeriodTypeOverrides, &filter).await?)
    }

    /// Overrides dated within `[from, to]`, oldest first.
    pub async fn overrides_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PeriodTypeOverride>, ConsoleError> {
        if to < from {
            return Ok(Vec::new());
        }
        if (to - from).num_days() > MAX_OVERRIDE_RANGE_DAYS {
            return Err(ConsoleError::LimitExceeded("override range too wide"));
        }
        let filter = Filter::new()
            .gte("date", from.to_string())
            .lte("date", to.to_string());
        Ok(fetch(
            self.store(),
            Table::PeriodTypeOverrides,
            &filter,
            Some(&OrderBy::asc("date")),
        )
        .await?)
    }

    pub async fn create_override(&self, new: NewOverride) -> Result<PeriodTypeOverride, ConsoleError> {
        validate_capacity(new.capacity)?;
        validate_notes(new.notes.as_deref())?;

        let row = to_row(
            Table::PeriodTypeOverrides,
            &OverrideRow {
                date: new.date,
                period_type_id: new.period_type_id,
                capacity: new.capacity,
                notes: new.notes.as_deref(),
                booking_id: new.booking_id,
            },
        )?;
        let created: PeriodTypeOverride = insert_as(self.store(), Table::PeriodTypeOverrides, row).await?;
        info!(
            "created override {} on {} for period type {}",
            created.id, created.date, created.period_type_id
        );
        metrics::counter!(OVERRIDE_MUTATIONS_TOTAL, "op" => "create").increment(1);
        self.publish(Change::OverrideCreated {
            id: created.id,
            booking_id: created.booking_id,
        });
        Ok(created)
    }

    pub async fn update_override(&self, id: Id, patch: OverridePatch) -> Result<PeriodTypeOverride, ConsoleError> {
        if patch.is_empty() {
            return Err(ConsoleError::EmptyPatch);
        }
        if let Some(capacity) = patch.capacity {
            validate_capacity(capacity)?;
        }
        if let Some(notes) = &patch.notes {
            validate_notes(notes.as_deref())?;
        }

        let existing = self.override_by_id(id).await?;
        self.store()
            .update_where(
                Table::PeriodTypeOverrides,
                &override_patch(&patch),
                &Filter::new().eq("id", id),
            )
            .await?;

        let updated = PeriodTypeOverride {
            id,
            date: patch.date.unwrap_or(existing.date),
            period_type_id: existing.period_type_id,
            capacity: patch.capacity.unwrap_or(existing.capacity),
            notes: patch.notes.unwrap_or(existing.notes),
            booking_id: patch.booking_id.unwrap_or(existing.booking_id),
        };
        info!("updated override {id}");
        metrics::counter!(OVERRIDE_MUTATIONS_TOTAL, "op" => "update").increment(1);
        self.publish(Change::OverrideUpdated {
            id,
            booking_id: updated.booking_id,
        });
        Ok(updated)
    }

    /// Remove an override. A linked booking is left in place; deleting it
    /// goes through the booking delete paths.
    pub async fn delete_override(&self, id: Id) -> Result<PeriodTypeOverride, ConsoleError> {
        let existing = self.override_by_id(id).await?;
        self.store()
            .delete_where(Table::PeriodTypeOverrides, &Filter::new().eq("id", id))
            .await?;
        info!("deleted override {id}");
        metrics::counter!(OVERRIDE_MUTATIONS_TOTAL, "op" => "delete").increment(1);
        self.publish(Change::OverrideDeleted {
            id,
            booking_id: existing.booking_id,
        });
        Ok(existing)
    }
}
