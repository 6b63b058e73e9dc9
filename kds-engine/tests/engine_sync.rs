//! End-to-end engine tests over the in-process store
//!
//! Covers the full loop: feed events into buckets, optimistic transitions
//! with rollback, supersession by authoritative events, announcements with
//! rotation, resynchronization, and the detach lifecycle.

use async_trait::async_trait;
use kds_engine::{
    AnnouncementSink, DeliveryProfile, EngineConfig, EngineError, KitchenLoad, MemoryStore,
    OrderStatus, Stage, SyncEngine,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Sink that records every dispatched announcement
struct RecordingSink {
    spoken: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
        })
    }

    fn messages(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl AnnouncementSink for RecordingSink {
    async fn announce(&self, message: &str, profile: &DeliveryProfile) {
        self.spoken
            .lock()
            .push((message.to_string(), profile.name.to_string()));
    }
}

fn test_config() -> EngineConfig {
    // Clock-independent announcements: profile assertions must not depend
    // on the wall-clock hour the test suite happens to run at
    EngineConfig::from_env()
        .with_timezone(chrono_tz::UTC)
        .with_time_based_profiles(false)
}

async fn attached_engine(store: &MemoryStore, sink: Arc<RecordingSink>) -> SyncEngine {
    let engine = SyncEngine::with_sink(Arc::new(store.clone()), test_config(), sink);
    engine.attach().await.expect("attach");
    engine
}

/// Let spawned workers drain their queues
async fn settle() {
    sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_initial_load_buckets_without_announcing() {
    let store = MemoryStore::new();
    store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("incoming"));
    store.insert_order("1 banku", "Table 2", Decimal::new(1200, 2), None, Some("processing"));
    store.insert_order("1 fufu", "Table 3", Decimal::new(1400, 2), None, Some("complete"));

    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink.clone()).await;
    settle().await;

    assert_eq!(engine.bucket(Stage::New).len(), 1);
    assert_eq!(engine.bucket(Stage::Active).len(), 1);
    assert_eq!(engine.bucket(Stage::Terminal).len(), 1);
    assert!(
        sink.messages().is_empty(),
        "bulk load is not a transition, nothing to announce"
    );
}

#[tokio::test]
async fn test_feed_insert_routes_and_announces_standard() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink.clone()).await;

    let row = store.insert_order(
        "1 jollof, 1 chicken",
        "Table 4",
        Decimal::new(2500, 2),
        None,
        Some("pending"),
    );
    settle().await;

    let fresh = engine.bucket(Stage::New);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].id, row.id);
    assert_eq!(fresh[0].status, OrderStatus::Pending);

    let spoken = sink.messages();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].1, "standard");
    assert!(spoken[0].0.contains("Table 4"));
}

#[tokio::test]
async fn test_consecutive_announcements_rotate_variants() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let _engine = attached_engine(&store, sink.clone()).await;

    store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    store.insert_order("1 waakye", "Table 2", Decimal::new(1100, 2), None, Some("pending"));
    store.insert_order("1 banku", "Table 3", Decimal::new(1200, 2), None, Some("pending"));
    settle().await;

    let spoken = sink.messages();
    assert_eq!(spoken.len(), 3);
    assert!(spoken.iter().all(|(_, p)| p == "standard"));
    // Two variants in the standard bucket: 0, 1, then wrap to 0
    let starts: Vec<&str> = spoken.iter().map(|(m, _)| &m[..9]).collect();
    assert_ne!(starts[0], starts[1]);
    assert_eq!(starts[0], starts[2]);
}

#[tokio::test]
async fn test_urgent_note_selects_urgent_profile() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let _engine = attached_engine(&store, sink.clone()).await;

    store.insert_order(
        "1 kelewele",
        "Table 9",
        Decimal::new(600, 2),
        Some("RUSH for the birthday table"),
        Some("pending"),
    );
    settle().await;

    let spoken = sink.messages();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].1, "urgent");
}

#[tokio::test]
async fn test_busy_load_overrides_standard() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink.clone()).await;
    engine.set_kitchen_load(KitchenLoad::Busy);

    store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;

    let spoken = sink.messages();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].1, "busy_kitchen");
}

#[tokio::test]
async fn test_duplicate_update_event_is_noop() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink.clone()).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;
    let updated = store.update_status_external(row.id, "processing").unwrap();

    // Deliver the exact same UPDATE again
    store
        .feed_sender()
        .send(shared::ChangeEvent::update(row.clone(), updated.clone()))
        .unwrap();
    settle().await;

    assert_eq!(engine.bucket(Stage::Active).len(), 1);
    assert_eq!(engine.bucket(Stage::New).len(), 0);
    assert_eq!(engine.order_count(), 1);
    // Only the original insert announced
    assert_eq!(sink.messages().len(), 1);
}

#[tokio::test]
async fn test_optimistic_transition_confirmed_by_store() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;

    engine
        .request_transition(row.id, OrderStatus::InProgress)
        .await
        .expect("transition");

    // Locally visible immediately; the store's echo event is a no-op
    assert_eq!(engine.order(row.id).unwrap().status, OrderStatus::InProgress);
    settle().await;
    assert_eq!(engine.bucket(Stage::Active).len(), 1);
    assert_eq!(engine.bucket(Stage::New).len(), 0);
    assert_eq!(
        store.row(row.id).unwrap().status.as_deref(),
        Some("IN_PROGRESS")
    );
}

#[tokio::test]
async fn test_write_failure_rolls_back_to_prior_snapshot() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("processing"));
    settle().await;
    let before = engine.order(row.id).unwrap();
    assert_eq!(before.status, OrderStatus::InProgress);

    store.set_fail_writes(true);
    let err = engine
        .request_transition(row.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WriteFailed(_)));
    assert!(err.is_recoverable());

    // Back in ACTIVE with the exact pre-transition snapshot
    let after = engine.order(row.id).unwrap();
    assert_eq!(after, before);
    assert_eq!(engine.bucket(Stage::Active).len(), 1);
    assert_eq!(engine.bucket(Stage::Terminal).len(), 0);

    // Retry succeeds once the store recovers
    store.set_fail_writes(false);
    engine
        .request_transition(row.id, OrderStatus::Completed)
        .await
        .expect("retry");
    assert_eq!(engine.bucket(Stage::Terminal).len(), 1);
}

#[tokio::test]
async fn test_feed_event_supersedes_pending_mutation() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;

    // Slow down the local write so the concurrent device wins the race,
    // and make it fail so its outcome would normally trigger a rollback
    store.set_write_delay_ms(100);
    store.set_fail_writes(true);
    let slow = {
        let engine = engine.clone();
        let id = row.id;
        tokio::spawn(async move { engine.request_transition(id, OrderStatus::InProgress).await })
    };
    sleep(Duration::from_millis(20)).await;
    assert_eq!(
        engine.order(row.id).unwrap().status,
        OrderStatus::InProgress,
        "optimistic change visible while the write is in flight"
    );

    // Another device rejects the order while our write is in flight
    store.update_status_external(row.id, "rejected");
    settle().await;

    // The authoritative event won: the late failure callback performs no
    // rollback, the caller still learns the write failed
    let result = slow.await.unwrap();
    assert!(matches!(result, Err(EngineError::WriteFailed(_))));
    settle().await;
    assert_eq!(engine.order(row.id).unwrap().status, OrderStatus::Rejected);
    assert_eq!(engine.bucket(Stage::Terminal).len(), 1);
    assert_eq!(engine.bucket(Stage::Active).len(), 0);
}

#[tokio::test]
async fn test_transition_preconditions() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let done = store.insert_order("1 fufu", "Table 2", Decimal::new(1400, 2), None, Some("complete"));
    let active = store.insert_order("1 banku", "Table 3", Decimal::new(1200, 2), None, Some("processing"));
    settle().await;

    // Unknown id
    let err = engine
        .request_transition(999, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OrderNotFound(999)));

    // Backward from TERMINAL
    let err = engine
        .request_transition(done.id, OrderStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransitionRejected { .. }));

    // ACTIVE -> NEW rejected unless the domain permits requeue
    let err = engine
        .request_transition(active.id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransitionRejected { .. }));
    assert_eq!(engine.bucket(Stage::Active).len(), 1, "no state change");
}

#[tokio::test]
async fn test_requeue_allowed_when_configured() {
    let store = MemoryStore::new();
    let config = test_config().with_requeue(true);
    let engine = SyncEngine::new(Arc::new(store.clone()), config);
    engine.attach().await.expect("attach");

    let row = store.insert_order("1 banku", "Table 3", Decimal::new(1200, 2), None, Some("processing"));
    settle().await;

    engine
        .request_transition(row.id, OrderStatus::Pending)
        .await
        .expect("requeue");
    assert_eq!(engine.bucket(Stage::New).len(), 1);
}

#[tokio::test]
async fn test_delete_event_removes_from_all_buckets() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;
    assert_eq!(engine.order_count(), 1);

    store.delete_order(row.id);
    settle().await;
    assert_eq!(engine.order_count(), 0);
    assert!(engine.order(row.id).is_none());
}

#[tokio::test]
async fn test_change_hook_fires_on_mutations() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;
    let mut changes = engine.subscribe_changes();

    store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;

    let change = changes.recv().await.expect("change notification");
    match change {
        kds_engine::BucketChange::Order { stage, .. } => {
            assert_eq!(stage, Some(Stage::New));
        }
        other => panic!("unexpected change: {:?}", other),
    }
}

#[tokio::test]
async fn test_lagged_feed_triggers_full_resync() {
    // Tiny feed buffer: flood it while the consumer is alive so the
    // receiver lags and the engine falls back to a bulk refetch
    let store = MemoryStore::with_feed_capacity(4);
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    for i in 0..200 {
        store.insert_order(
            &format!("{} jollof", i),
            &format!("Table {}", i),
            Decimal::new(1000, 2),
            None,
            Some("pending"),
        );
    }
    // Give the consumer time to lag, resync, and drain the tail
    sleep(Duration::from_millis(300)).await;

    assert_eq!(engine.order_count(), 200, "view converged with the store");
    assert_eq!(engine.bucket(Stage::New).len(), 200);
}

#[tokio::test]
async fn test_detach_discards_pending_and_ignores_inflight_write() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let row = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;

    store.set_write_delay_ms(100);
    store.set_fail_writes(true);
    let inflight = {
        let engine = engine.clone();
        let id = row.id;
        tokio::spawn(async move { engine.request_transition(id, OrderStatus::InProgress).await })
    };
    sleep(Duration::from_millis(20)).await;

    engine.detach();
    assert!(!engine.is_attached());

    // The failed write completes after detach: no rollback happens because
    // the pending table was discarded - the optimistic snapshot stays
    let result = inflight.await.unwrap();
    assert!(matches!(result, Err(EngineError::WriteFailed(_))));
    assert_eq!(engine.order(row.id).unwrap().status, OrderStatus::InProgress);

    // Detached engines reject new transitions
    let err = engine
        .request_transition(row.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Detached));
}

#[tokio::test]
async fn test_reattach_resyncs_and_resets_rotation() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink.clone()).await;
    let first_epoch = engine.epoch().unwrap();

    store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("pending"));
    settle().await;
    assert_eq!(sink.messages().len(), 1);
    let first_message = sink.messages()[0].0.clone();

    engine.detach();
    // Rows written while detached are picked up by the reattach fetch
    store.insert_order("1 waakye", "Table 2", Decimal::new(1100, 2), None, Some("processing"));

    engine.attach().await.expect("reattach");
    settle().await;
    assert_ne!(engine.epoch().unwrap(), first_epoch);
    assert_eq!(engine.order_count(), 2);

    // Fresh attachment, fresh rotation counters: the next standard
    // announcement starts from variant 0 again
    store.insert_order("1 banku", "Table 3", Decimal::new(1200, 2), None, Some("pending"));
    settle().await;
    let spoken = sink.messages();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[1].0[..9], first_message[..9]);
}

#[tokio::test]
async fn test_legacy_labels_normalize_at_the_boundary() {
    let store = MemoryStore::new();
    let sink = RecordingSink::new();
    let engine = attached_engine(&store, sink).await;

    let incoming = store.insert_order("1 jollof", "Table 1", Decimal::new(1000, 2), None, Some("incoming"));
    let unknown = store.insert_order("1 waakye", "Table 2", Decimal::new(1100, 2), None, Some("???"));
    let missing = store.insert_order("1 banku", "Table 3", Decimal::new(1200, 2), None, None);
    settle().await;

    // All three normalize into NEW with the canonical PENDING label
    let fresh = engine.bucket(Stage::New);
    assert_eq!(fresh.len(), 3);
    for id in [incoming.id, unknown.id, missing.id] {
        assert_eq!(engine.order(id).unwrap().status, OrderStatus::Pending);
    }
}
