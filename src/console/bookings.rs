use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::model::*;
use crate::notify::Change;
use crate::observability::{BOOKINGS_DELETED_TOTAL, INSTANCES_DELETED_TOTAL, INSTANCES_EDITED_TOTAL};
use crate::store::{fetch, fetch_one, Filter, OrderBy, Patch, Table};

use super::scope::{
    resolve_delete_targets, DeletePlan, DeleteRequest, InstanceTargets, ParentDeletion, ScopeSelection,
    SeriesInfo,
};
use super::{validate_capacity, validate_notes, Console, ConsoleError};

fn instance_patch(patch: &InstancePatch) -> Patch {
    let mut out = Patch::new();
    if let Some(t) = patch.start_time {
        out.insert("start_time".into(), Value::from(t.to_string()));
    }
    if let Some(t) = patch.end_time {
        out.insert("end_time".into(), Value::from(t.to_string()));
    }
    if let Some(capacity) = patch.capacity {
        out.insert("capacity".into(), capacity.map_or(Value::Null, Value::from));
    }
    if let Some(notes) = &patch.notes {
        out.insert("notes".into(), notes.clone().map_or(Value::Null, Value::from));
    }
    out
}

impl Console {
    pub async fn booking(&self, booking_id: Id) -> Result<Booking, ConsoleError> {
        fetch_one(self.store(), Table::Bookings, &Filter::new().eq("id", booking_id))
            .await?
            .ok_or(ConsoleError::NotFound {
                table: Table::Bookings,
                id: booking_id,
            })
    }

    pub async fn booking_instances(&self, booking_id: Id) -> Result<Vec<BookingInstance>, ConsoleError> {
        Ok(fetch(
            self.store(),
            Table::BookingInstances,
            &Filter::new().eq("booking_id", booking_id),
            Some(&OrderBy::asc("date")),
        )
        .await?)
    }

    /// Series details for the occurrence the dialog was opened on.
    pub async fn series_info(&self, booking_id: Id, occurrence_date: NaiveDate) -> Result<SeriesInfo, ConsoleError> {
        let booking = self.booking(booking_id).await?;
        Ok(SeriesInfo::new(booking.recurrence_type, occurrence_date))
    }

    /// Delete the ticked instances; the booking goes too if none remain.
    /// An empty selection is rejected before any store call.
    pub async fn delete_instances(&self, booking_id: Id, instance_ids: &[Id]) -> Result<DeleteOutcome, ConsoleError> {
        let plan = resolve_delete_targets(booking_id, DeleteRequest::Selected(instance_ids.to_vec()))?;
        self.execute_delete(plan).await
    }

    /// Delete every instance, then the booking.
    pub async fn delete_series(&self, booking_id: Id) -> Result<DeleteOutcome, ConsoleError> {
        let plan = resolve_delete_targets(booking_id, DeleteRequest::Series)?;
        self.execute_delete(plan).await
    }

    pub async fn delete_scoped(&self, booking_id: Id, selection: &ScopeSelection) -> Result<DeleteOutcome, ConsoleError> {
        let selection = self.bind_selection(booking_id, selection).await?;
        let plan = resolve_delete_targets(booking_id, DeleteRequest::Scoped(selection))?;
        self.execute_delete(plan).await
    }

    /// Re-resolve a selection against the stored booking's recurrence, so a
    /// non-recurring booking is only ever touched at its own occurrence.
    async fn bind_selection(&self, booking_id: Id, selection: &ScopeSelection) -> Result<ScopeSelection, ConsoleError> {
        let booking = self.booking(booking_id).await?;
        let series = SeriesInfo::new(booking.recurrence_type, selection.series().occurrence_date);
        let bound = ScopeSelection::resolve(series, selection.scope());
        if bound.scope() != selection.scope() {
            debug!(
                "booking {booking_id} is {:?}; narrowed {:?} to {:?}",
                booking.recurrence_type,
                selection.scope(),
                bound.scope()
            );
        }
        Ok(bound)
    }

    /// Instances first, then the parent. A failure stops the sequence;
    /// whatever was already deleted stays deleted.
    async fn execute_delete(&self, plan: DeletePlan) -> Result<DeleteOutcome, ConsoleError> {
        let booking_id = plan.booking_id;
        let of_booking = Filter::new().eq("booking_id", booking_id);

        let deleted_instances: Vec<Id> = match &plan.instances {
            InstanceTargets::Ids(ids) => {
                let filter = of_booking.clone().in_list("id", ids.iter().copied());
                let owned: Vec<BookingInstance> = fetch(self.store(), Table::BookingInstances, &filter, None).await?;
                let matched: Vec<Id> = ids.iter().copied().filter(|id| owned.iter().any(|i| i.id == *id)).collect();
                if matched.len() < ids.len() {
                    debug!(
                        "{} selected ids are not instances of booking {booking_id}",
                        ids.len() - matched.len()
                    );
                }
                if !matched.is_empty() {
                    self.store().delete_where(Table::BookingInstances, &filter).await?;
                }
                matched
            }
            InstanceTargets::Scoped(selection) => {
                let ids = selection.targets(&self.booking_instances(booking_id).await?);
                if !ids.is_empty() {
                    let filter = of_booking.clone().in_list("id", ids.iter().copied());
                    self.store().delete_where(Table::BookingInstances, &filter).await?;
                }
                ids
            }
            InstanceTargets::AllOfBooking => {
                let ids: Vec<Id> = self
                    .booking_instances(booking_id)
                    .await?
                    .into_iter()
                    .map(|i| i.id)
                    .collect();
                self.store().delete_where(Table::BookingInstances, &of_booking).await?;
                ids
            }
        };

        if !deleted_instances.is_empty() {
            info!("deleted {} instances of booking {booking_id}", deleted_instances.len());
            metrics::counter!(INSTANCES_DELETED_TOTAL).increment(deleted_instances.len() as u64);
            self.publish(Change::BookingInstancesDeleted {
                booking_id,
                instance_ids: deleted_instances.clone(),
            });
        }

        let remaining = match plan.parent {
            ParentDeletion::Always => 0,
            ParentDeletion::IfEmpty => {
                self.store()
                    .select_where(Table::BookingInstances, &of_booking, None)
                    .await?
                    .len()
            }
        };
        let parent_deleted = plan.deletes_parent(remaining);
        if parent_deleted {
            self.store()
                .delete_where(Table::Bookings, &Filter::new().eq("id", booking_id))
                .await?;
            info!("deleted booking {booking_id}");
            metrics::counter!(BOOKINGS_DELETED_TOTAL).increment(1);
            self.publish(Change::BookingDeleted { booking_id });
        } else {
            debug!("booking {booking_id} keeps {remaining} instances");
        }

        Ok(DeleteOutcome {
            booking_id,
            deleted_instances,
            parent_deleted,
        })
    }

    /// Apply `patch` to every instance the selection covers, in one update.
    /// Returns the ids that were rewritten.
    pub async fn edit_scoped(
        &self,
        booking_id: Id,
        selection: &ScopeSelection,
        patch: InstancePatch,
    ) -> Result<Vec<Id>, ConsoleError> {
        if patch.is_empty() {
            return Err(ConsoleError::EmptyPatch);
        }
        if let Some(Some(capacity)) = patch.capacity {
            validate_capacity(capacity)?;
        }
        if let Some(notes) = &patch.notes {
            validate_notes(notes.as_deref())?;
        }

        let selection = self.bind_selection(booking_id, selection).await?;
        let instances = self.booking_instances(booking_id).await?;
        let targeted: Vec<&BookingInstance> = instances.iter().filter(|i| selection.includes(i.date)).collect();
        for instance in &targeted {
            let start = patch.start_time.unwrap_or(instance.start_time);
            let end = patch.end_time.unwrap_or(instance.end_time);
            if start >= end {
                return Err(ConsoleError::InvalidTimeRange);
            }
        }
        let ids: Vec<Id> = targeted.iter().map(|i| i.id).collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        let filter = Filter::new()
            .eq("booking_id", booking_id)
            .in_list("id", ids.iter().copied());
        self.store()
            .update_where(Table::BookingInstances, &instance_patch(&patch), &filter)
            .await?;
        info!(
            "edited {} instances of booking {booking_id} ({:?})",
            ids.len(),
            selection.scope()
        );
        metrics::counter!(INSTANCES_EDITED_TOTAL).increment(ids.len() as u64);
        self.publish(Change::BookingInstancesUpdated {
            booking_id,
            instance_ids: ids.clone(),
        });
        Ok(ids)
    }
}
