//! In-process order store
//!
//! Backs tests and demos without a hosted store: a row map plus a broadcast
//! fan-out of row-level events, mirroring what the real feed delivers.
//! Write behavior is injectable (forced failures, artificial latency) so
//! rollback and supersession paths can be exercised deterministically.

use super::{OrderStore, StageFilter};
use crate::core::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{ChangeEvent, OrderRow, OrderStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Feed channel capacity
///
/// Small enough that tests can force a lag-and-resync cycle by flooding it.
const DEFAULT_FEED_CAPACITY: usize = 256;

/// In-memory [`OrderStore`]
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    rows: Mutex<BTreeMap<i64, OrderRow>>,
    feed_tx: broadcast::Sender<ChangeEvent>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Store with a custom feed capacity (tests shrink it to force lag)
    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (feed_tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(MemoryStoreInner {
                rows: Mutex::new(BTreeMap::new()),
                feed_tx,
                next_id: AtomicU64::new(1),
                fail_writes: AtomicBool::new(false),
                write_delay_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Make subsequent `write_status` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay `write_status` completions (simulates a slow round trip)
    pub fn set_write_delay_ms(&self, millis: u64) {
        self.inner.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Insert a new order row and emit an INSERT event
    ///
    /// `status` is the raw label as another writer would send it - legacy
    /// schema and garbage included. Returns the stored row.
    pub fn insert_order(
        &self,
        name: &str,
        table_no: &str,
        price: rust_decimal::Decimal,
        note: Option<&str>,
        status: Option<&str>,
    ) -> OrderRow {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let row = OrderRow {
            id,
            name: name.to_string(),
            table_no: table_no.to_string(),
            price,
            note: note.map(str::to_string),
            status: status.map(str::to_string),
            created_at: Some(shared::util::now_iso()),
            updated_at: None,
        };
        self.inner.rows.lock().insert(id, row.clone());
        self.emit(ChangeEvent::insert(row.clone()));
        row
    }

    /// Apply an UPDATE from a concurrent writer (another kitchen device)
    ///
    /// Takes a raw label on purpose: other devices may speak the legacy
    /// schema.
    pub fn update_status_external(&self, id: i64, raw_status: &str) -> Option<OrderRow> {
        let (old, new) = {
            let mut rows = self.inner.rows.lock();
            let old = rows.get(&id)?.clone();
            let mut new = old.clone();
            new.status = Some(raw_status.to_string());
            new.updated_at = Some(shared::util::now_iso());
            rows.insert(id, new.clone());
            (old, new)
        };
        self.emit(ChangeEvent::update(old, new.clone()));
        Some(new)
    }

    /// Delete a row and emit a DELETE event
    pub fn delete_order(&self, id: i64) -> Option<OrderRow> {
        let old = self.inner.rows.lock().remove(&id)?;
        self.emit(ChangeEvent::delete(old.clone()));
        Some(old)
    }

    /// Raw feed sender, for tests that inject duplicate or odd events
    pub fn feed_sender(&self) -> broadcast::Sender<ChangeEvent> {
        self.inner.feed_tx.clone()
    }

    /// Current row, bypassing the feed
    pub fn row(&self, id: i64) -> Option<OrderRow> {
        self.inner.rows.lock().get(&id).cloned()
    }

    fn emit(&self, event: ChangeEvent) {
        // No receivers is fine - the feed is fire-and-forget on this side
        let _ = self.inner.feed_tx.send(event);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn fetch_bucket(&self, filter: StageFilter) -> Result<Vec<OrderRow>, StoreError> {
        let rows = self.inner.rows.lock();
        let mut out: Vec<OrderRow> = rows
            .values()
            .filter(|r| filter.matches(r.status.as_deref()))
            .cloned()
            .collect();
        // Newest first, matching the hosted store's `order by id desc`
        out.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    async fn write_status(&self, id: i64, status: OrderStatus) -> Result<(), StoreError> {
        let delay = self.inner.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }

        let (old, new) = {
            let mut rows = self.inner.rows.lock();
            let old = rows
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::WriteFailed(format!("row {} not found", id)))?;
            let mut new = old.clone();
            new.status = Some(status.as_str().to_string());
            new.updated_at = Some(shared::util::now_iso());
            rows.insert(id, new.clone());
            (old, new)
        };
        self.emit(ChangeEvent::update(old, new));
        Ok(())
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        Ok(self.inner.feed_tx.subscribe())
    }
}
