mod memory;

pub use memory::{InMemoryStore, StoreCall};

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A row as exchanged with the store: column name → JSON value.
pub type Row = Map<String, Value>;

/// Columns to overwrite on every matching row.
pub type Patch = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Sides,
    PeriodTypeDefaults,
    CapacitySchedules,
    PeriodTypeOverrides,
    Bookings,
    BookingInstances,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Sides => "sides",
            Table::PeriodTypeDefaults => "period_type_defaults",
            Table::CapacitySchedules => "capacity_schedules",
            Table::PeriodTypeOverrides => "period_type_overrides",
            Table::Bookings => "bookings",
            Table::BookingInstances => "booking_instances",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
}

impl StoreOp {
    pub fn label(self) -> &'static str {
        match self {
            StoreOp::Select => "select",
            StoreOp::Insert => "insert",
            StoreOp::Update => "update",
            StoreOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store rejected or failed the call.
    Backend {
        table: Table,
        op: StoreOp,
        message: String,
    },
    /// A row came back in a shape the console cannot read.
    Decode { table: Table, message: String },
}

impl StoreError {
    pub fn backend(table: Table, op: StoreOp, message: impl Into<String>) -> Self {
        StoreError::Backend {
            table,
            op,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Backend { table, op, message } => {
                write!(f, "{} on {table} failed: {message}", op.label())
            }
            StoreError::Decode { table, message } => {
                write!(f, "unreadable row in {table}: {message}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ── Filters ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    IsNull(String),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lte(String, Value),
}

/// Conjunction of column conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    /// `column = value`, or `column IS NULL` when `value` is absent.
    pub fn eq_or_null<V: Into<Value>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self.is_null(column),
        }
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push(Condition::In(column.into(), values));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte(column.into(), value.into()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte(column.into(), value.into()));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| condition_matches(c, row))
    }
}

fn column<'a>(row: &'a Row, name: &str) -> &'a Value {
    row.get(name).unwrap_or(&Value::Null)
}

fn condition_matches(condition: &Condition, row: &Row) -> bool {
    match condition {
        Condition::Eq(col, v) => values_equal(column(row, col), v),
        Condition::IsNull(col) => column(row, col).is_null(),
        Condition::In(col, vs) => {
            let actual = column(row, col);
            vs.iter().any(|v| values_equal(actual, v))
        }
        Condition::Gte(col, v) => matches!(
            compare_values(column(row, col), v),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Condition::Lte(col, v) => matches!(
            compare_values(column(row, col), v),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Numbers compare numerically, strings lexically (ISO dates and times sort
/// correctly that way). Mixed or null operands are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

// ── Store trait ──────────────────────────────────────────────────

/// Every read and write the console makes, as one of four shapes over JSON
/// rows: select, insert, update or delete by filter.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select_where(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert a row; the store fills in `id` and returns the stored row.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    async fn update_where(&self, table: Table, patch: &Patch, filter: &Filter) -> Result<(), StoreError>;

    async fn delete_where(&self, table: Table, filter: &Filter) -> Result<(), StoreError>;
}

/// Wraps another store, timing every call and logging failures.
pub struct Instrumented {
    inner: Arc<dyn Store>,
}

impl Instrumented {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self { inner }
    }
}

fn observe<T>(table: Table, op: StoreOp, started: Instant, result: &Result<T, StoreError>) {
    metrics::histogram!(
        crate::observability::STORE_CALL_DURATION_SECONDS,
        "table" => table.name(),
        "op" => op.label()
    )
    .record(started.elapsed().as_secs_f64());
    if let Err(e) = result {
        tracing::debug!("store call failed: {e}");
    }
}

#[async_trait]
impl Store for Instrumented {
    async fn select_where(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&OrderBy>,
    ) -> Result<Vec<Row>, StoreError> {
        let started = Instant::now();
        let result = self.inner.select_where(table, filter, order).await;
        observe(table, StoreOp::Select, started, &result);
        result
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let started = Instant::now();
        let result = self.inner.insert(table, row).await;
        observe(table, StoreOp::Insert, started, &result);
        result
    }

    async fn update_where(&self, table: Table, patch: &Patch, filter: &Filter) -> Result<(), StoreError> {
        let started = Instant::now();
        let result = self.inner.update_where(table, patch, filter).await;
        observe(table, StoreOp::Update, started, &result);
        result
    }

    async fn delete_where(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        let started = Instant::now();
        let result = self.inner.delete_where(table, filter).await;
        observe(table, StoreOp::Delete, started, &result);
        result
    }
}

// ── Typed helpers ────────────────────────────────────────────────

pub fn decode<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Decode {
        table,
        message: e.to_string(),
    })
}

/// Serialize a value into a row. Non-object values are a programming error
/// and reported as a decode failure.
pub fn to_row<T: Serialize>(table: Table, value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::Decode {
            table,
            message: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(StoreError::Decode {
            table,
            message: e.to_string(),
        }),
    }
}

pub async fn fetch<T: DeserializeOwned>(
    store: &dyn Store,
    table: Table,
    filter: &Filter,
    order: Option<&OrderBy>,
) -> Result<Vec<T>, StoreError> {
    store
        .select_where(table, filter, order)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn Store,
    table: Table,
    filter: &Filter,
) -> Result<Option<T>, StoreError> {
    let mut rows = store.select_where(table, filter, None).await?;
    if rows.is_empty() {
        return Ok(None);
    }
    decode(table, rows.swap_remove(0)).map(Some)
}

pub async fn insert_as<T: DeserializeOwned>(store: &dyn Store, table: Table, row: Row) -> Result<T, StoreError> {
    let stored = store.insert(table, row).await?;
    decode(table, stored)
}
