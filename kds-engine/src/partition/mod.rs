//! Partition store - the order set split into lifecycle buckets
//!
//! One bucket per [`Stage`], plus an id → stage index. Guarantees:
//!
//! - every known order is in exactly one bucket, keyed by its status stage
//! - an id appears at most once across all buckets combined
//! - bucket state after an operation depends only on (prior state, input)
//!
//! Mutations are serialized under a single lock. Readers never block
//! writers: each write publishes a fresh immutable bucket list
//! (`Arc<Vec<Arc<OrderSnapshot>>>`), so a renderer holding a view keeps a
//! consistent copy while the store moves on.

use parking_lot::RwLock;
use shared::{OrderSnapshot, Stage};
use std::collections::HashMap;
use std::sync::Arc;

/// Published, immutable view of one bucket (most-recent-first)
pub type BucketView = Arc<Vec<Arc<OrderSnapshot>>>;

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Whether any bucket content changed (false for an identical snapshot)
    pub changed: bool,
    /// Stage the order now sits in
    pub stage: Stage,
    /// Stage the order previously sat in, if it was known
    pub previous_stage: Option<Stage>,
    /// The order entered the NEW stage for the first time in this
    /// lineage - the trigger for an announcement
    pub entered_new: bool,
}

/// Per-id bookkeeping
struct IndexEntry {
    stage: Stage,
    /// Set once the order has been seen in the NEW stage; cleared only when
    /// the id is removed, so reverts and re-normalizations never re-trigger
    seen_new: bool,
}

struct Buckets {
    index: HashMap<i64, IndexEntry>,
    new: BucketView,
    active: BucketView,
    terminal: BucketView,
}

impl Buckets {
    fn view(&self, stage: Stage) -> &BucketView {
        match stage {
            Stage::New => &self.new,
            Stage::Active => &self.active,
            Stage::Terminal => &self.terminal,
        }
    }

    fn view_mut(&mut self, stage: Stage) -> &mut BucketView {
        match stage {
            Stage::New => &mut self.new,
            Stage::Active => &mut self.active,
            Stage::Terminal => &mut self.terminal,
        }
    }

    /// Publish a new list for `stage` with `id` filtered out
    fn remove_from(&mut self, stage: Stage, id: i64) {
        let current = self.view(stage);
        let next: Vec<Arc<OrderSnapshot>> =
            current.iter().filter(|o| o.id != id).cloned().collect();
        *self.view_mut(stage) = Arc::new(next);
    }

    /// Publish a new list for `stage` with `snapshot` at the head
    fn insert_head(&mut self, stage: Stage, snapshot: Arc<OrderSnapshot>) {
        let current = self.view(stage);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(snapshot);
        next.extend(current.iter().cloned());
        *self.view_mut(stage) = Arc::new(next);
    }

    /// Publish a new list for `stage` with `snapshot` replacing its old
    /// entry in place (keeps bucket position on same-stage updates)
    fn replace_in_place(&mut self, stage: Stage, snapshot: Arc<OrderSnapshot>) {
        let current = self.view(stage);
        let next: Vec<Arc<OrderSnapshot>> = current
            .iter()
            .map(|o| {
                if o.id == snapshot.id {
                    Arc::clone(&snapshot)
                } else {
                    Arc::clone(o)
                }
            })
            .collect();
        *self.view_mut(stage) = Arc::new(next);
    }
}

/// The partition store
///
/// Exclusively owned by the synchronization facade; consumers only ever see
/// published [`BucketView`]s.
pub struct PartitionStore {
    inner: RwLock<Buckets>,
}

impl Default for PartitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Buckets {
                index: HashMap::new(),
                new: Arc::new(Vec::new()),
                active: Arc::new(Vec::new()),
                terminal: Arc::new(Vec::new()),
            }),
        }
    }

    /// Insert or replace the order with a matching id
    ///
    /// If the order is present in a different bucket it is atomically moved;
    /// within the same bucket an updated snapshot keeps its position. New
    /// arrivals go to the head of their bucket (most-recent-first).
    /// Idempotent: re-applying an identical snapshot changes nothing.
    pub fn upsert(&self, snapshot: OrderSnapshot) -> UpsertOutcome {
        let stage = snapshot.status.stage();
        let id = snapshot.id;
        let mut inner = self.inner.write();

        match inner.index.get(&id) {
            Some(entry) => {
                let previous_stage = entry.stage;
                let seen_new = entry.seen_new;

                if previous_stage == stage {
                    // Same bucket: no-op if the snapshot is identical
                    let identical = inner
                        .view(stage)
                        .iter()
                        .find(|o| o.id == id)
                        .is_some_and(|o| o.as_ref() == &snapshot);
                    if identical {
                        return UpsertOutcome {
                            changed: false,
                            stage,
                            previous_stage: Some(previous_stage),
                            entered_new: false,
                        };
                    }
                    inner.replace_in_place(stage, Arc::new(snapshot));
                } else {
                    inner.remove_from(previous_stage, id);
                    inner.insert_head(stage, Arc::new(snapshot));
                }

                let entered_new = stage == Stage::New && !seen_new;
                inner.index.insert(
                    id,
                    IndexEntry {
                        stage,
                        seen_new: seen_new || stage == Stage::New,
                    },
                );
                UpsertOutcome {
                    changed: true,
                    stage,
                    previous_stage: Some(previous_stage),
                    entered_new,
                }
            }
            None => {
                inner.insert_head(stage, Arc::new(snapshot));
                inner.index.insert(
                    id,
                    IndexEntry {
                        stage,
                        seen_new: stage == Stage::New,
                    },
                );
                UpsertOutcome {
                    changed: true,
                    stage,
                    previous_stage: None,
                    entered_new: stage == Stage::New,
                }
            }
        }
    }

    /// Remove the order from whichever bucket holds it
    ///
    /// Returns the removed snapshot; no-op (None) if the id is unknown.
    pub fn remove(&self, id: i64) -> Option<OrderSnapshot> {
        let mut inner = self.inner.write();
        let entry = inner.index.remove(&id)?;
        let removed = inner
            .view(entry.stage)
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.as_ref().clone());
        inner.remove_from(entry.stage, id);
        removed
    }

    /// Immutable ordered view of a bucket
    pub fn bucket(&self, stage: Stage) -> BucketView {
        Arc::clone(self.inner.read().view(stage))
    }

    /// Current snapshot of an order, if known
    pub fn get(&self, id: i64) -> Option<OrderSnapshot> {
        let inner = self.inner.read();
        let entry = inner.index.get(&id)?;
        inner
            .view(entry.stage)
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.as_ref().clone())
    }

    /// Total number of orders across all buckets
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all buckets and rebuild from a bulk fetch
    ///
    /// Used on (re)attachment and after missed feed events, since missed
    /// events are undetectable from the feed alone. Orders landing in the
    /// NEW bucket are marked as already seen - a bulk load is not a
    /// transition and must not trigger announcements.
    pub fn replace_all(&self, snapshots: Vec<OrderSnapshot>) {
        let mut index = HashMap::with_capacity(snapshots.len());
        let mut new = Vec::new();
        let mut active = Vec::new();
        let mut terminal = Vec::new();

        for snapshot in snapshots {
            let stage = snapshot.status.stage();
            // Last row wins on duplicate ids in the fetch
            if let Some(prev) = index.insert(
                snapshot.id,
                IndexEntry {
                    stage,
                    seen_new: stage == Stage::New,
                },
            ) {
                match prev.stage {
                    Stage::New => new.retain(|o: &Arc<OrderSnapshot>| o.id != snapshot.id),
                    Stage::Active => active.retain(|o: &Arc<OrderSnapshot>| o.id != snapshot.id),
                    Stage::Terminal => {
                        terminal.retain(|o: &Arc<OrderSnapshot>| o.id != snapshot.id)
                    }
                }
            }
            let snapshot = Arc::new(snapshot);
            match stage {
                Stage::New => new.push(snapshot),
                Stage::Active => active.push(snapshot),
                Stage::Terminal => terminal.push(snapshot),
            }
        }

        let mut inner = self.inner.write();
        inner.index = index;
        inner.new = Arc::new(new);
        inner.active = Arc::new(active);
        inner.terminal = Arc::new(terminal);
    }
}
