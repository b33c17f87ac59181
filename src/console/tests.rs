use super::*;
use crate::cache::{run_invalidator, CacheKey, QueryCache};
use crate::store::{InMemoryStore, Row, StoreCall, StoreOp};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn time(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn setup() -> (Arc<InMemoryStore>, Console) {
    let store = Arc::new(InMemoryStore::new());
    let console = Console::new(store.clone(), Arc::new(ChangeHub::new()));
    (store, console)
}

async fn seed(store: &InMemoryStore, table: Table, value: Value) -> Row {
    store
        .insert(table, value.as_object().cloned().unwrap())
        .await
        .unwrap()
}

async fn seed_schedule(store: &InMemoryStore, id: Id, side_id: Option<Id>, capacity: u32, platforms: Value) {
    seed(
        store,
        Table::CapacitySchedules,
        json!({
            "id": id,
            "period_type_id": 1,
            "side_id": side_id,
            "day_of_week": 0,
            "start_time": "09:00:00",
            "end_time": "10:00:00",
            "capacity": capacity,
            "platforms": platforms,
        }),
    )
    .await;
}

async fn seed_booking(store: &InMemoryStore, id: Id, recurrence: &str, dates: &[(Id, &str)]) {
    seed(
        store,
        Table::Bookings,
        json!({"id": id, "title": "Swim club", "recurrence_type": recurrence, "starts_on": dates[0].1}),
    )
    .await;
    for (instance_id, d) in dates {
        seed(
            store,
            Table::BookingInstances,
            json!({
                "id": instance_id,
                "booking_id": id,
                "date": d,
                "start_time": "09:00:00",
                "end_time": "10:00:00",
            }),
        )
        .await;
    }
}

async fn schedule(console: &Console, id: Id) -> CapacitySchedule {
    fetch_one(console.store(), Table::CapacitySchedules, &Filter::new().eq("id", id))
        .await
        .unwrap()
        .unwrap()
}

fn save(capacity: u32, platforms: &[PlatformId]) -> SaveDefault {
    SaveDefault {
        period_type_id: 1,
        side_key: None,
        capacity,
        platforms: platforms.to_vec(),
    }
}

fn mutated(calls: &[StoreCall]) -> bool {
    calls
        .iter()
        .any(|c| matches!(c.op, StoreOp::Insert | StoreOp::Update | StoreOp::Delete))
}

// ── Defaults ─────────────────────────────────────────────────────

#[tokio::test]
async fn first_default_is_inserted_without_reconciliation() {
    let (store, console) = setup();
    seed_schedule(&store, 1, None, 10, json!([1, 2])).await;
    store.reset_calls();

    let outcome = console.save_default(save(10, &[2, 1])).await.unwrap();
    assert_eq!(outcome.reconciliation, ReconcileStatus::NotNeeded);
    assert_eq!(outcome.default.default_capacity, 10);
    assert_eq!(outcome.default.platforms, Some(vec![1, 2]));
    assert_eq!(store.row_count(Table::PeriodTypeDefaults), 1);
    // schedules never read without a prior default
    assert!(!store
        .calls()
        .iter()
        .any(|c| c.table == Table::CapacitySchedules));
}

#[tokio::test]
async fn new_default_migrates_only_inheriting_entries() {
    let (store, console) = setup();
    console.save_default(save(10, &[1, 2])).await.unwrap();
    seed_schedule(&store, 1, None, 10, json!([1, 2])).await;
    seed_schedule(&store, 2, None, 10, json!([1])).await;
    seed_schedule(&store, 3, None, 9, json!([1, 2])).await;

    let outcome = console.save_default(save(8, &[2, 1])).await.unwrap();
    assert_eq!(outcome.reconciliation, ReconcileStatus::Migrated(vec![1]));
    assert_eq!(store.row_count(Table::PeriodTypeDefaults), 1);

    let s1 = schedule(&console, 1).await;
    assert_eq!((s1.capacity, s1.platforms), (8, Some(vec![1, 2])));
    let s2 = schedule(&console, 2).await;
    assert_eq!((s2.capacity, s2.platforms), (10, Some(vec![1])));
    let s3 = schedule(&console, 3).await;
    assert_eq!((s3.capacity, s3.platforms), (9, Some(vec![1, 2])));
}

#[tokio::test]
async fn null_and_empty_platforms_inherit_alike() {
    let (store, console) = setup();
    console.save_default(save(5, &[])).await.unwrap();
    seed_schedule(&store, 1, None, 5, Value::Null).await;
    seed_schedule(&store, 2, None, 5, json!([])).await;

    let outcome = console.save_default(save(6, &[])).await.unwrap();
    assert_eq!(outcome.reconciliation, ReconcileStatus::Migrated(vec![1, 2]));
    for id in [1, 2] {
        let s = schedule(&console, id).await;
        assert_eq!(s.capacity, 6);
        assert_eq!(s.platforms, None);
    }
}

#[tokio::test]
async fn unchanged_default_skips_schedule_fetch() {
    let (store, console) = setup();
    console.save_default(save(5, &[3])).await.unwrap();
    seed_schedule(&store, 1, None, 5, json!([3])).await;
    store.reset_calls();

    let outcome = console.save_default(save(5, &[3])).await.unwrap();
    assert_eq!(outcome.reconciliation, ReconcileStatus::NotNeeded);
    assert!(!store
        .calls()
        .iter()
        .any(|c| c.table == Table::CapacitySchedules));
}

#[tokio::test]
async fn side_default_leaves_other_sides_alone() {
    let (store, console) = setup();
    seed(&store, Table::Sides, json!({"id": 7, "key": "north"})).await;
    seed(&store, Table::Sides, json!({"id": 8, "key": "south"})).await;

    let mut req = save(10, &[]);
    req.side_key = Some("north".into());
    console.save_default(req.clone()).await.unwrap();
    seed_schedule(&store, 1, Some(7), 10, Value::Null).await;
    seed_schedule(&store, 2, Some(8), 10, Value::Null).await;
    seed_schedule(&store, 3, None, 10, Value::Null).await;

    req.capacity = 12;
    let outcome = console.save_default(req).await.unwrap();
    assert_eq!(outcome.default.side_id, Some(7));
    assert_eq!(outcome.reconciliation, ReconcileStatus::Migrated(vec![1]));
    assert_eq!(schedule(&console, 2).await.capacity, 10);
    assert_eq!(schedule(&console, 3).await.capacity, 10);
}

#[tokio::test]
async fn unknown_side_fails_before_any_write() {
    let (store, console) = setup();
    let mut req = save(10, &[]);
    req.side_key = Some("east".into());

    let err = console.save_default(req).await.unwrap_err();
    assert_eq!(err, ConsoleError::UnresolvedSide("east".into()));
    assert!(err.is_validation());
    assert!(!mutated(&store.calls()));
    assert_eq!(store.row_count(Table::PeriodTypeDefaults), 0);
}

#[tokio::test]
async fn overlong_side_key_is_rejected_without_store_calls() {
    let (store, console) = setup();
    let mut req = save(10, &[]);
    req.side_key = Some("k".repeat(crate::limits::MAX_SIDE_KEY_LEN + 1));

    let err = console.save_default(req).await.unwrap_err();
    assert_eq!(err, ConsoleError::LimitExceeded("side key too long"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn oversized_default_is_rejected_without_store_calls() {
    let (store, console) = setup();
    let err = console
        .save_default(save(crate::limits::MAX_CAPACITY + 1, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::LimitExceeded(_)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn failed_schedule_fetch_keeps_saved_default() {
    let (store, console) = setup();
    console.save_default(save(10, &[])).await.unwrap();
    seed_schedule(&store, 1, None, 10, Value::Null).await;
    store.inject_failure(Table::CapacitySchedules, StoreOp::Select, "timeout");

    let outcome = console.save_default(save(4, &[])).await.unwrap();
    match outcome.reconciliation {
        ReconcileStatus::Failed(msg) => assert!(msg.contains("timeout")),
        other => panic!("expected failure, got {other:?}"),
    }
    let saved = console.default_for(1, None).await.unwrap().unwrap();
    assert_eq!(saved.default_capacity, 4);

    store.clear_failure(Table::CapacitySchedules, StoreOp::Select);
    assert_eq!(schedule(&console, 1).await.capacity, 10);
}

#[tokio::test]
async fn failed_schedule_update_is_reported_not_raised() {
    let (store, console) = setup();
    console.save_default(save(10, &[])).await.unwrap();
    seed_schedule(&store, 1, None, 10, Value::Null).await;
    store.inject_failure(Table::CapacitySchedules, StoreOp::Update, "permission denied");

    let outcome = console.save_default(save(4, &[])).await.unwrap();
    assert!(matches!(outcome.reconciliation, ReconcileStatus::Failed(_)));
    assert_eq!(outcome.default.default_capacity, 4);
}

#[tokio::test]
async fn failed_default_write_is_a_primary_error() {
    let (store, console) = setup();
    store.inject_failure(Table::PeriodTypeDefaults, StoreOp::Insert, "offline");
    let err = console.save_default(save(10, &[])).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Store(_)));
    assert!(!err.is_validation());
}

#[tokio::test]
async fn default_changes_are_published() {
    let (store, console) = setup();
    let mut rx = console.notify.subscribe();
    console.save_default(save(10, &[])).await.unwrap();
    seed_schedule(&store, 1, None, 10, Value::Null).await;
    console.save_default(save(11, &[])).await.unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        Change::DefaultSaved {
            period_type_id: 1,
            side_id: None
        }
    );
    assert!(matches!(rx.recv().await.unwrap(), Change::DefaultSaved { .. }));
    assert_eq!(
        rx.recv().await.unwrap(),
        Change::SchedulesMigrated {
            period_type_id: 1,
            schedule_ids: vec![1]
        }
    );
}

// ── Booking deletion ─────────────────────────────────────────────

#[tokio::test]
async fn deleting_some_instances_keeps_parent() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10"), (103, "2024-06-17")]).await;

    let outcome = console.delete_instances(1, &[101, 102]).await.unwrap();
    assert_eq!(outcome.deleted_instances, vec![101, 102]);
    assert!(!outcome.parent_deleted);
    let left: Vec<Id> = console.booking_instances(1).await.unwrap().iter().map(|i| i.id).collect();
    assert_eq!(left, vec![103]);
    assert!(console.booking(1).await.is_ok());

    let outcome = console.delete_instances(1, &[103]).await.unwrap();
    assert!(outcome.parent_deleted);
    assert!(matches!(console.booking(1).await, Err(ConsoleError::NotFound { .. })));
}

#[tokio::test]
async fn deleting_every_instance_deletes_parent() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10"), (103, "2024-06-17")]).await;

    let outcome = console.delete_instances(1, &[101, 102, 103]).await.unwrap();
    assert!(outcome.parent_deleted);
    assert_eq!(store.row_count(Table::Bookings), 0);
    assert_eq!(store.row_count(Table::BookingInstances), 0);
}

#[tokio::test]
async fn empty_selection_makes_no_store_call() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03")]).await;
    store.reset_calls();

    let err = console.delete_instances(1, &[]).await.unwrap_err();
    assert_eq!(err, ConsoleError::EmptySelection);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn selected_delete_ignores_other_bookings_instances() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03")]).await;
    seed_booking(&store, 2, "weekly", &[(201, "2024-06-03")]).await;

    let mut rx = console.notify.subscribe();
    let outcome = console.delete_instances(1, &[201]).await.unwrap();
    assert!(outcome.deleted_instances.is_empty());
    assert!(!outcome.parent_deleted);
    assert_eq!(console.booking_instances(1).await.unwrap().len(), 1);
    assert_eq!(console.booking_instances(2).await.unwrap().len(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn selected_delete_reports_only_owned_instances() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10")]).await;
    seed_booking(&store, 2, "weekly", &[(201, "2024-06-03")]).await;
    let mut rx = console.notify.subscribe();

    let outcome = console.delete_instances(1, &[201, 102]).await.unwrap();
    assert_eq!(outcome.deleted_instances, vec![102]);
    assert_eq!(
        rx.recv().await.unwrap(),
        Change::BookingInstancesDeleted {
            booking_id: 1,
            instance_ids: vec![102]
        }
    );
    assert_eq!(store.row_count(Table::BookingInstances), 2);
}

#[tokio::test]
async fn series_delete_removes_everything() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10")]).await;
    seed_booking(&store, 2, "single", &[(201, "2024-06-03")]).await;

    let outcome = console.delete_series(1).await.unwrap();
    assert_eq!(outcome.deleted_instances, vec![101, 102]);
    assert!(outcome.parent_deleted);
    assert_eq!(store.row_count(Table::Bookings), 1);
    assert_eq!(store.row_count(Table::BookingInstances), 1);
}

#[tokio::test]
async fn future_delete_keeps_earlier_occurrences() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10"), (103, "2024-06-17")]).await;

    let series = console.series_info(1, date("2024-06-10")).await.unwrap();
    let mut dialog = ScopeDialog::open(series);
    dialog.select(EditScope::Future);
    let outcome = console.delete_scoped(1, &dialog.confirm()).await.unwrap();

    assert_eq!(outcome.deleted_instances, vec![102, 103]);
    assert!(!outcome.parent_deleted);
    let left: Vec<Id> = console.booking_instances(1).await.unwrap().iter().map(|i| i.id).collect();
    assert_eq!(left, vec![101]);
}

#[tokio::test]
async fn single_booking_scope_falls_back_to_occurrence() {
    let (store, console) = setup();
    seed_booking(&store, 1, "single", &[(101, "2024-06-03")]).await;

    let series = console.series_info(1, date("2024-06-03")).await.unwrap();
    let selection = ScopeSelection::resolve(series, EditScope::All);
    assert_eq!(selection.scope(), EditScope::Single);

    let outcome = console.delete_scoped(1, &selection).await.unwrap();
    assert_eq!(outcome.deleted_instances, vec![101]);
    assert!(outcome.parent_deleted);
}

#[tokio::test]
async fn recurring_selection_narrows_on_single_booking() {
    let (store, console) = setup();
    seed_booking(&store, 1, "single", &[(101, "2024-06-03")]).await;

    let weekly = SeriesInfo::new(RecurrenceType::Weekly, date("2024-06-01"));
    let selection = ScopeSelection::try_new(weekly, EditScope::Future).unwrap();

    let outcome = console.delete_scoped(1, &selection).await.unwrap();
    assert!(outcome.deleted_instances.is_empty());
    assert!(!outcome.parent_deleted);
    assert_eq!(store.row_count(Table::BookingInstances), 1);
    assert_eq!(store.row_count(Table::Bookings), 1);

    let patch = InstancePatch {
        notes: Some(Some("moved".into())),
        ..Default::default()
    };
    let edited = console.edit_scoped(1, &selection, patch).await.unwrap();
    assert!(edited.is_empty());
    assert_eq!(console.booking_instances(1).await.unwrap()[0].notes, None);
}

#[tokio::test]
async fn instance_delete_failure_stops_before_parent() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03")]).await;
    store.reset_calls();
    store.inject_failure(Table::BookingInstances, StoreOp::Delete, "conflict");

    let err = console.delete_instances(1, &[101]).await.unwrap_err();
    assert!(err.to_string().contains("conflict"));
    assert!(!store.calls().iter().any(|c| c.table == Table::Bookings));
    assert_eq!(store.row_count(Table::Bookings), 1);
}

#[tokio::test]
async fn parent_delete_failure_keeps_deleted_instances_deleted() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10")]).await;
    store.inject_failure(Table::Bookings, StoreOp::Delete, "foreign key");

    let err = console.delete_series(1).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Store(_)));
    assert_eq!(store.row_count(Table::BookingInstances), 0);
    assert_eq!(store.row_count(Table::Bookings), 1);
}

#[tokio::test]
async fn deletion_invalidates_booking_views() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10")]).await;

    let cache = Arc::new(QueryCache::new());
    for key in [
        CacheKey::booking_info(1),
        CacheKey::booking_instances(1),
        CacheKey::booking_series("all"),
        CacheKey::snapshot("2024-06-03"),
        CacheKey::booking_info(2),
    ] {
        cache.put(key, json!({}));
    }
    let rx = console.notify.subscribe();

    console.delete_instances(1, &[101]).await.unwrap();
    drop(console);
    run_invalidator(cache.clone(), rx).await;

    assert_eq!(cache.len(), 1);
    assert!(cache.get(&CacheKey::booking_info(2)).is_some());
}

// ── Scoped edits ─────────────────────────────────────────────────

#[tokio::test]
async fn future_edit_rewrites_later_instances() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03"), (102, "2024-06-10"), (103, "2024-06-17")]).await;

    let series = console.series_info(1, date("2024-06-10")).await.unwrap();
    let selection = ScopeSelection::try_new(series, EditScope::Future).unwrap();
    let patch = InstancePatch {
        start_time: Some(time(8)),
        capacity: Some(Some(12)),
        ..Default::default()
    };
    let ids = console.edit_scoped(1, &selection, patch).await.unwrap();
    assert_eq!(ids, vec![102, 103]);

    let instances = console.booking_instances(1).await.unwrap();
    assert_eq!(instances[0].start_time, time(9));
    assert_eq!(instances[0].capacity, None);
    for i in &instances[1..] {
        assert_eq!(i.start_time, time(8));
        assert_eq!(i.capacity, Some(12));
    }
}

#[tokio::test]
async fn edit_producing_inverted_times_is_rejected() {
    let (store, console) = setup();
    seed_booking(&store, 1, "weekly", &[(101, "2024-06-03")]).await;
    let selection = ScopeSelection::resolve(
        SeriesInfo::new(RecurrenceType::Weekly, date("2024-06-03")),
        EditScope::All,
    );
    store.reset_calls();

    let patch = InstancePatch {
        start_time: Some(time(11)),
        ..Default::default()
    };
    let err = console.edit_scoped(1, &selection, patch).await.unwrap_err();
    assert_eq!(err, ConsoleError::InvalidTimeRange);
    assert!(!mutated(&store.calls()));
}

#[tokio::test]
async fn empty_edit_is_rejected() {
    let (_store, console) = setup();
    let selection = ScopeSelection::resolve(
        SeriesInfo::new(RecurrenceType::Single, date("2024-06-03")),
        EditScope::Single,
    );
    let err = console
        .edit_scoped(1, &selection, InstancePatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, ConsoleError::EmptyPatch);
}

// ── Overrides ────────────────────────────────────────────────────

fn new_override(d: &str, booking_id: Option<Id>) -> NewOverride {
    NewOverride {
        date: date(d),
        period_type_id: 1,
        capacity: 3,
        notes: Some("gala".into()),
        booking_id,
    }
}

#[tokio::test]
async fn override_lifecycle() {
    let (_store, console) = setup();
    let created = console.create_override(new_override("2024-06-10", None)).await.unwrap();
    assert_eq!(created.capacity, 3);

    let found = console.override_on(date("2024-06-10"), 1).await.unwrap();
    assert_eq!(found, Some(created.clone()));

    let updated = console
        .update_override(
            created.id,
            OverridePatch {
                capacity: Some(6),
                notes: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.capacity, 6);
    assert_eq!(updated.notes, None);
    assert_eq!(console.override_by_id(created.id).await.unwrap(), updated);

    console.delete_override(created.id).await.unwrap();
    assert!(matches!(
        console.override_by_id(created.id).await,
        Err(ConsoleError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deleting_override_keeps_linked_booking() {
    let (store, console) = setup();
    seed_booking(&store, 5, "single", &[(501, "2024-06-10")]).await;
    let created = console.create_override(new_override("2024-06-10", Some(5))).await.unwrap();

    let deleted = console.delete_override(created.id).await.unwrap();
    assert_eq!(deleted.booking_id, Some(5));
    assert!(console.booking(5).await.is_ok());
    assert_eq!(console.booking_instances(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn updating_missing_override_is_not_found() {
    let (_store, console) = setup();
    let err = console
        .update_override(
            42,
            OverridePatch {
                capacity: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ConsoleError::NotFound {
            table: Table::PeriodTypeOverrides,
            id: 42
        }
    );
}

#[tokio::test]
async fn overrides_between_is_inclusive_and_ordered() {
    let (_store, console) = setup();
    for d in ["2024-06-20", "2024-06-01", "2024-06-10", "2024-07-02"] {
        console.create_override(new_override(d, None)).await.unwrap();
    }
    let found = console
        .overrides_between(date("2024-06-01"), date("2024-06-20"))
        .await
        .unwrap();
    let dates: Vec<String> = found.iter().map(|o| o.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-06-01", "2024-06-10", "2024-06-20"]);

    assert!(console
        .overrides_between(date("2024-06-20"), date("2024-06-01"))
        .await
        .unwrap()
        .is_empty());
    assert!(matches!(
        console.overrides_between(date("2024-01-01"), date("2025-06-01")).await,
        Err(ConsoleError::LimitExceeded(_))
    ));
}

#[tokio::test]
async fn override_notes_limit() {
    let (store, console) = setup();
    let mut req = new_override("2024-06-10", None);
    req.notes = Some("x".repeat(crate::limits::MAX_NOTES_LEN + 1));
    assert!(matches!(
        console.create_override(req).await,
        Err(ConsoleError::LimitExceeded(_))
    ));
    assert!(store.calls().is_empty());
}

// ── Snapshot ─────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_uses_schedule_then_override() {
    let (store, console) = setup();
    // 2024-06-10 is a Monday
    seed_schedule(&store, 1, None, 10, json!([2, 1])).await;

    let snap = console.capacity_snapshot(date("2024-06-10"), 1, None).await.unwrap();
    assert_eq!(snap.windows.len(), 1);
    assert_eq!(snap.windows[0].capacity, 10);
    assert_eq!(snap.windows[0].platforms, vec![1, 2]);
    assert_eq!(snap.windows[0].source, CapacitySource::Schedule(1));
    assert_eq!(snap.fallback, None);

    let o = console.create_override(new_override("2024-06-10", None)).await.unwrap();
    let snap = console.capacity_snapshot(date("2024-06-10"), 1, None).await.unwrap();
    assert_eq!(snap.windows[0].capacity, 3);
    assert_eq!(snap.windows[0].source, CapacitySource::Override(o.id));

    // Tuesday has no window
    let snap = console.capacity_snapshot(date("2024-06-11"), 1, None).await.unwrap();
    assert!(snap.windows.is_empty());
}

#[tokio::test]
async fn snapshot_falls_back_to_global_default() {
    let (store, console) = setup();
    seed(&store, Table::Sides, json!({"id": 7, "key": "north"})).await;
    console.save_default(save(14, &[4])).await.unwrap();

    let snap = console
        .capacity_snapshot(date("2024-06-11"), 1, Some("north"))
        .await
        .unwrap();
    assert_eq!(snap.side_id, Some(7));
    assert_eq!(
        snap.fallback,
        Some(DefaultValues {
            capacity: 14,
            platforms: Some(vec![4])
        })
    );
}
