use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::*;
use crate::notify::Change;
use crate::observability::{DEFAULTS_SAVED_TOTAL, SCHEDULES_MIGRATED_TOTAL, SECONDARY_FAILURES_TOTAL};
use crate::platforms::to_stored;
use crate::store::{fetch, fetch_one, insert_as, to_row, Filter, OrderBy, Patch, StoreError, Table};

use super::reconcile::{is_noop, reconcile_default};
use super::{validate_capacity, validate_platforms, Console, ConsoleError};

#[derive(Serialize)]
struct DefaultRow<'a> {
    period_type_id: Id,
    side_id: Option<Id>,
    default_capacity: u32,
    platforms: Option<&'a [PlatformId]>,
}

fn scope_filter(period_type_id: Id, side_id: Option<Id>) -> Filter {
    Filter::new()
        .eq("period_type_id", period_type_id)
        .eq_or_null("side_id", side_id)
}

fn secondary_failure(step: &'static str, e: StoreError) -> ReconcileStatus {
    warn!("default saved but {step} failed: {e}");
    metrics::counter!(SECONDARY_FAILURES_TOTAL, "step" => step).increment(1);
    ReconcileStatus::Failed(e.to_string())
}

impl Console {
    pub async fn default_for(
        &self,
        period_type_id: Id,
        side_key: Option<&str>,
    ) -> Result<Option<PeriodTypeDefault>, ConsoleError> {
        let side_id = self.resolve_side(side_key).await?;
        Ok(self.load_default(period_type_id, side_id).await?)
    }

    pub(super) async fn load_default(
        &self,
        period_type_id: Id,
        side_id: Option<Id>,
    ) -> Result<Option<PeriodTypeDefault>, StoreError> {
        fetch_one(
            self.store(),
            Table::PeriodTypeDefaults,
            &scope_filter(period_type_id, side_id),
        )
        .await
    }

    /// Schedule windows for a (period type, side) pair, ordered by weekday.
    pub async fn schedules_for(
        &self,
        period_type_id: Id,
        side_key: Option<&str>,
    ) -> Result<Vec<CapacitySchedule>, ConsoleError> {
        let side_id = self.resolve_side(side_key).await?;
        Ok(fetch(
            self.store(),
            Table::CapacitySchedules,
            &scope_filter(period_type_id, side_id),
            Some(&OrderBy::asc("day_of_week")),
        )
        .await?)
    }

    /// Save the default for a (period type, side) pair, then move every
    /// schedule entry that was still inheriting the previous default onto
    /// the new values.
    ///
    /// Validation and side lookup happen before any write. Once the default
    /// itself is written the call succeeds; a failure while migrating the
    /// schedule entries is reported in [`SaveDefaultOutcome::reconciliation`]
    /// and the default is not rolled back.
    pub async fn save_default(&self, req: SaveDefault) -> Result<SaveDefaultOutcome, ConsoleError> {
        validate_capacity(req.capacity)?;
        validate_platforms(&req.platforms)?;
        let side_id = self.resolve_side(req.side_key.as_deref()).await?;

        let prior = self.load_default(req.period_type_id, side_id).await?;
        let new = DefaultValues {
            capacity: req.capacity,
            platforms: to_stored(&req.platforms),
        };

        let saved = match &prior {
            Some(existing) => {
                let mut patch = Patch::new();
                patch.insert("default_capacity".into(), Value::from(new.capacity));
                patch.insert(
                    "platforms".into(),
                    new.platforms.clone().map_or(Value::Null, Value::from),
                );
                self.store()
                    .update_where(
                        Table::PeriodTypeDefaults,
                        &patch,
                        &Filter::new().eq("id", existing.id),
                    )
                    .await?;
                PeriodTypeDefault {
                    default_capacity: new.capacity,
                    platforms: new.platforms.clone(),
                    ..existing.clone()
                }
            }
            None => {
                let row = to_row(
                    Table::PeriodTypeDefaults,
                    &DefaultRow {
                        period_type_id: req.period_type_id,
                        side_id,
                        default_capacity: new.capacity,
                        platforms: new.platforms.as_deref(),
                    },
                )?;
                insert_as(self.store(), Table::PeriodTypeDefaults, row).await?
            }
        };
        info!(
            "saved default {} for period type {} side {:?}: capacity {}",
            saved.id, saved.period_type_id, saved.side_id, saved.default_capacity
        );
        metrics::counter!(DEFAULTS_SAVED_TOTAL).increment(1);
        self.publish(Change::DefaultSaved {
            period_type_id: saved.period_type_id,
            side_id: saved.side_id,
        });

        let reconciliation = match prior {
            Some(old) => self.migrate_inheriting(&saved, &old.values(), &new).await,
            None => ReconcileStatus::NotNeeded,
        };
        Ok(SaveDefaultOutcome {
            default: saved,
            reconciliation,
        })
    }

    async fn migrate_inheriting(
        &self,
        saved: &PeriodTypeDefault,
        old: &DefaultValues,
        new: &DefaultValues,
    ) -> ReconcileStatus {
        if is_noop(Some(old), new) {
            return ReconcileStatus::NotNeeded;
        }
        let candidates: Vec<CapacitySchedule> = match fetch(
            self.store(),
            Table::CapacitySchedules,
            &scope_filter(saved.period_type_id, saved.side_id),
            None,
        )
        .await
        {
            Ok(c) => c,
            Err(e) => return secondary_failure("reconcile_fetch", e),
        };

        let migration = reconcile_default(Some(old), new, &candidates);
        debug!(
            "{} of {} schedule entries inherit the old default",
            migration.schedule_ids.len(),
            candidates.len()
        );
        if migration.is_empty() {
            return ReconcileStatus::NotNeeded;
        }

        let filter = Filter::new().in_list("id", migration.schedule_ids.iter().copied());
        if let Err(e) = self
            .store()
            .update_where(Table::CapacitySchedules, &migration.patch(), &filter)
            .await
        {
            return secondary_failure("reconcile_update", e);
        }

        info!(
            "migrated {} schedule entries to default {}",
            migration.schedule_ids.len(),
            saved.id
        );
        metrics::counter!(SCHEDULES_MIGRATED_TOTAL).increment(migration.schedule_ids.len() as u64);
        self.publish(Change::SchedulesMigrated {
            period_type_id: saved.period_type_id,
            schedule_ids: migration.schedule_ids.clone(),
        });
        ReconcileStatus::Migrated(migration.schedule_ids)
    }
}
