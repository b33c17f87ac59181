use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{compare_values, Filter, OrderBy, Patch, Row, Store, StoreError, StoreOp, Table};

#[derive(Default)]
struct TableState {
    next_id: i64,
    rows: Vec<Row>,
}

/// One recorded store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCall {
    pub table: Table,
    pub op: StoreOp,
}

/// Reference adapter holding every table in memory.
///
/// Besides backing tests and local runs it records each call and can be told
/// to fail a (table, op) pair, which is how partial-failure paths are driven.
pub struct InMemoryStore {
    tables: DashMap<Table, TableState>,
    failures: DashMap<(Table, StoreOp), String>,
    calls: Mutex<Vec<StoreCall>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            failures: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent `op` on `table` fail with `message`.
    pub fn inject_failure(&self, table: Table, op: StoreOp, message: &str) {
        self.failures.insert((table, op), message.to_string());
    }

    pub fn clear_failure(&self, table: Table, op: StoreOp) {
        self.failures.remove(&(table, op));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, |t| t.rows.len())
    }

    fn begin(&self, table: Table, op: StoreOp) -> Result<(), StoreError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(StoreCall { table, op });
        }
        match self.failures.get(&(table, op)) {
            Some(message) => Err(StoreError::backend(table, op, message.value().clone())),
            None => Ok(()),
        }
    }
}

fn row_order(a: &Row, b: &Row, order: &OrderBy) -> Ordering {
    let av = a.get(&order.column).unwrap_or(&Value::Null);
    let bv = b.get(&order.column).unwrap_or(&Value::Null);
    // Nulls sort last ascending, matching Postgres.
    let ord = match (av.is_null(), bv.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_values(av, bv).unwrap_or(Ordering::Equal),
    };
    if order.ascending { ord } else { ord.reverse() }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn select_where(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError> {
        self.begin(table, StoreOp::Select)?;
        let mut rows: Vec<Row> = self
            .tables
            .get(&table)
            .map(|t| t.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| row_order(a, b, order));
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        self.begin(table, StoreOp::Insert)?;
        let mut state = self.tables.entry(table).or_default();
        let id = match row.get("id").and_then(Value::as_i64) {
            Some(id) => {
                if state.rows.iter().any(|r| r.get("id").and_then(Value::as_i64) == Some(id)) {
                    return Err(StoreError::backend(
                        table,
                        StoreOp::Insert,
                        format!("duplicate key value violates unique constraint: id={id}"),
                    ));
                }
                id
            }
            None => state.next_id.max(1),
        };
        state.next_id = state.next_id.max(id + 1);
        row.insert("id".into(), Value::from(id));
        state.rows.push(row.clone());
        Ok(row)
    }

    async fn update_where(&self, table: Table, patch: &Patch, filter: &Filter) -> Result<(), StoreError> {
        self.begin(table, StoreOp::Update)?;
        if let Some(mut state) = self.tables.get_mut(&table) {
            for row in state.rows.iter_mut().filter(|r| filter.matches(r)) {
                for (column, value) in patch {
                    if column != "id" {
                        row.insert(column.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete_where(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        self.begin(table, StoreOp::Delete)?;
        if let Some(mut state) = self.tables.get_mut(&table) {
            state.rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert(Table::Sides, row(json!({"key": "north"}))).await.unwrap();
        let b = store.insert(Table::Sides, row(json!({"key": "south"}))).await.unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
    }

    #[tokio::test]
    async fn explicit_ids_advance_the_sequence() {
        let store = InMemoryStore::new();
        store.insert(Table::Bookings, row(json!({"id": 40}))).await.unwrap();
        let next = store.insert(Table::Bookings, row(json!({}))).await.unwrap();
        assert_eq!(next["id"], json!(41));
        let dup = store.insert(Table::Bookings, row(json!({"id": 40}))).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let store = InMemoryStore::new();
        for (d, b) in [("2024-06-17", 1), ("2024-06-10", 1), ("2024-06-03", 2)] {
            store
                .insert(Table::BookingInstances, row(json!({"booking_id": b, "date": d})))
                .await
                .unwrap();
        }
        let rows = store
            .select_where(
                Table::BookingInstances,
                &Filter::new().eq("booking_id", 1),
                Some(&OrderBy::asc("date")),
            )
            .await
            .unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r["date"].clone()).collect();
        assert_eq!(dates, vec![json!("2024-06-10"), json!("2024-06-17")]);

        let rows = store
            .select_where(Table::BookingInstances, &Filter::new(), Some(&OrderBy::desc("date")))
            .await
            .unwrap();
        assert_eq!(rows[0]["date"], json!("2024-06-17"));
    }

    #[tokio::test]
    async fn update_and_delete_only_touch_matching_rows() {
        let store = InMemoryStore::new();
        for cap in [10, 10, 9] {
            store
                .insert(Table::CapacitySchedules, row(json!({"capacity": cap})))
                .await
                .unwrap();
        }
        let patch = row(json!({"capacity": 8, "id": 99}));
        store
            .update_where(Table::CapacitySchedules, &patch, &Filter::new().eq("capacity", 10))
            .await
            .unwrap();
        let eights = store
            .select_where(Table::CapacitySchedules, &Filter::new().eq("capacity", 8), None)
            .await
            .unwrap();
        assert_eq!(eights.len(), 2);
        // id is never rewritten by a patch
        assert!(eights.iter().all(|r| r["id"] != json!(99)));

        store
            .delete_where(Table::CapacitySchedules, &Filter::new().eq("capacity", 8))
            .await
            .unwrap();
        assert_eq!(store.row_count(Table::CapacitySchedules), 1);
    }

    #[tokio::test]
    async fn injected_failure_is_reported_and_logged() {
        let store = InMemoryStore::new();
        store.inject_failure(Table::Bookings, StoreOp::Delete, "boom");
        let err = store
            .delete_where(Table::Bookings, &Filter::new().eq("id", 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(
            store.calls(),
            vec![StoreCall {
                table: Table::Bookings,
                op: StoreOp::Delete
            }]
        );

        store.clear_failure(Table::Bookings, StoreOp::Delete);
        assert!(store.delete_where(Table::Bookings, &Filter::new()).await.is_ok());
    }
}
