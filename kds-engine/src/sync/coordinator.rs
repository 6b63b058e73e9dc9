//! Pending-mutation table for optimistic transitions
//!
//! One in-flight mutation per order id, tagged with a monotonically
//! increasing local sequence number. Entries are garbage-collected on
//! confirmation, rejection, or supersession by a newer local request or an
//! authoritative feed event.

use parking_lot::Mutex;
use shared::{OrderSnapshot, OrderStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-flight optimistic change
#[derive(Debug, Clone)]
pub struct PendingMutation {
    /// Local sequence number; later requests supersede earlier ones
    pub seq: u64,
    /// Status the local write is trying to reach
    pub target: OrderStatus,
    /// Snapshot being replaced, kept for rollback
    pub prior: OrderSnapshot,
}

/// Per-id pending mutation table
///
/// Owned exclusively by the engine facade; all access goes through the
/// methods below so the seq discipline cannot be bypassed.
#[derive(Default)]
pub struct MutationTable {
    next_seq: AtomicU64,
    pending: Mutex<HashMap<i64, PendingMutation>>,
}

impl MutationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending mutation, superseding any older one for the
    /// same id. Returns the fresh sequence number.
    pub fn begin(&self, id: i64, target: OrderStatus, prior: OrderSnapshot) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut pending = self.pending.lock();
        if let Some(old) = pending.insert(id, PendingMutation { seq, target, prior }) {
            tracing::debug!(
                order_id = id,
                superseded_seq = old.seq,
                seq,
                "Newer local request supersedes pending mutation"
            );
        }
        seq
    }

    /// Settle the write callback for (id, seq)
    ///
    /// Returns the entry iff it is still current - i.e. no feed event and
    /// no newer local request got there first. A `None` means the callback
    /// must be a no-op.
    pub fn settle(&self, id: i64, seq: u64) -> Option<PendingMutation> {
        let mut pending = self.pending.lock();
        match pending.get(&id) {
            Some(current) if current.seq == seq => pending.remove(&id),
            _ => None,
        }
    }

    /// Discard the pending mutation for an id (authoritative event wins)
    ///
    /// No rollback: the caller is about to apply the store's view anyway.
    pub fn supersede(&self, id: i64) -> Option<PendingMutation> {
        self.pending.lock().remove(&id)
    }

    /// Discard everything (detach)
    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    /// Number of in-flight mutations
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
