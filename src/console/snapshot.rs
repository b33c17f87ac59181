use chrono::{Datelike, NaiveDate};

use crate::model::*;
use crate::platforms::normalize;
use crate::store::{fetch, Filter, OrderBy, Table};

use super::{Console, ConsoleError};

impl Console {
    /// Effective capacity for one period type on one date.
    ///
    /// Weekly schedule windows for the weekday are the base. A date override
    /// replaces the capacity of every window. With no window for the day the
    /// live default is reported instead: the side's own default first, then
    /// the global one.
    pub async fn capacity_snapshot(
        &self,
        date: NaiveDate,
        period_type_id: Id,
        side_key: Option<&str>,
    ) -> Result<CapacitySnapshot, ConsoleError> {
        let side_id = self.resolve_side(side_key).await?;
        let weekday = date.weekday().num_days_from_monday();

        let filter = Filter::new()
            .eq("period_type_id", period_type_id)
            .eq_or_null("side_id", side_id)
            .eq("day_of_week", weekday);
        let schedules: Vec<CapacitySchedule> = fetch(
            self.store(),
            Table::CapacitySchedules,
            &filter,
            Some(&OrderBy::asc("start_time")),
        )
        .await?;
        let day_override = self.override_on(date, period_type_id).await?;

        let windows = schedules
            .iter()
            .map(|s| SnapshotWindow {
                start_time: s.start_time,
                end_time: s.end_time,
                capacity: day_override.as_ref().map_or(s.capacity, |o| o.capacity),
                platforms: normalize(s.platforms.as_deref()),
                source: day_override
                    .as_ref()
                    .map_or(CapacitySource::Schedule(s.id), |o| CapacitySource::Override(o.id)),
            })
            .collect::<Vec<_>>();

        let fallback = if windows.is_empty() {
            let own = self.load_default(period_type_id, side_id).await?;
            let inherited = match (own, side_id) {
                (Some(d), _) => Some(d),
                (None, Some(_)) => self.load_default(period_type_id, None).await?,
                (None, None) => None,
            };
            inherited.map(|d| {
                let mut values = d.values();
                if let Some(o) = &day_override {
                    values.capacity = o.capacity;
                }
                values
            })
        } else {
            None
        };

        Ok(CapacitySnapshot {
            date,
            period_type_id,
            side_id,
            windows,
            fallback,
        })
    }
}
