//! SyncEngine - the synchronization facade
//!
//! The only public surface of the engine. Wires the partition store, the
//! change-feed consumer, the optimistic mutation coordinator and the
//! announcement pipeline together, and owns their lifecycle:
//!
//! - `attach()` - bulk fetch, subscribe, spawn workers (fresh epoch)
//! - `detach()` - cancel workers, discard pending mutations
//!
//! The engine is explicitly constructed with its collaborators injected,
//! so tests (and multi-screen deployments) can run independent instances
//! side by side.

use crate::announce::worker::{AnnounceJob, AnnounceWorker};
use crate::announce::{AnnouncementSink, KitchenLoad, NullSink};
use crate::core::{EngineConfig, EngineError, EngineResult};
use crate::partition::{BucketView, PartitionStore};
use crate::store::{OrderStore, StageFilter};
use crate::sync::MutationTable;
use crate::sync::feed::ChangeFeedConsumer;
use parking_lot::{Mutex, RwLock};
use shared::{OrderSnapshot, OrderStatus, Stage};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Re-render notification, fired after every successful bucket mutation
#[derive(Debug, Clone)]
pub enum BucketChange {
    /// One order changed bucket or content
    Order {
        id: i64,
        /// Stage the order now sits in; `None` after a removal
        stage: Option<Stage>,
        previous_stage: Option<Stage>,
    },
    /// Buckets were rebuilt wholesale (attach or resynchronization)
    Refreshed,
}

/// One attachment's runtime state
struct Attachment {
    /// Unique id per attachment; a new epoch means counters were reset
    epoch: String,
    cancel: CancellationToken,
    announce_tx: mpsc::Sender<AnnounceJob>,
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Shared engine state, reachable from the facade and its workers
pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    pub(crate) store: Arc<dyn OrderStore>,
    pub(crate) partition: PartitionStore,
    pub(crate) mutations: MutationTable,
    change_tx: broadcast::Sender<BucketChange>,
    kitchen_load: RwLock<KitchenLoad>,
    attachment: Mutex<Option<Attachment>>,
}

impl EngineInner {
    /// Apply an authoritative snapshot from the feed (or a bulk row)
    ///
    /// Discards any pending local mutation for the id first: the store's
    /// view wins over an unconfirmed guess. Bucket mutation completes
    /// synchronously; announcement dispatch is queued best-effort.
    pub(crate) fn apply_authoritative(&self, snapshot: OrderSnapshot) {
        let id = snapshot.id;
        if self.mutations.supersede(id).is_some() {
            tracing::debug!(order_id = id, "Feed event supersedes pending mutation");
        }
        let outcome = self.partition.upsert(snapshot.clone());
        if !outcome.changed {
            return;
        }
        self.notify(BucketChange::Order {
            id,
            stage: Some(outcome.stage),
            previous_stage: outcome.previous_stage,
        });
        if outcome.entered_new {
            self.queue_announcement(snapshot);
        }
    }

    /// Apply an authoritative removal from the feed
    pub(crate) fn apply_removal(&self, id: i64) {
        if self.mutations.supersede(id).is_some() {
            tracing::debug!(order_id = id, "Delete event supersedes pending mutation");
        }
        if let Some(removed) = self.partition.remove(id) {
            self.notify(BucketChange::Order {
                id,
                stage: None,
                previous_stage: Some(removed.status.stage()),
            });
        }
    }

    /// Discard all buckets and rebuild from a fresh bulk fetch
    ///
    /// Used on attach and whenever feed events may have been missed, since
    /// missed events are undetectable from the feed alone.
    pub(crate) async fn resync(&self) -> EngineResult<()> {
        let rows = self
            .store
            .fetch_bucket(StageFilter::All)
            .await
            .map_err(EngineError::FeedDisconnected)?;
        let snapshots: Vec<OrderSnapshot> =
            rows.into_iter().map(OrderSnapshot::from_row).collect();
        tracing::info!(orders = snapshots.len(), "Resynchronized from store");
        self.partition.replace_all(snapshots);
        self.notify(BucketChange::Refreshed);
        Ok(())
    }

    pub(crate) fn notify(&self, change: BucketChange) {
        // No subscribers is fine; rendering may not have started yet
        let _ = self.change_tx.send(change);
    }

    /// Queue an announcement for a newly actionable order (best-effort)
    fn queue_announcement(&self, order: OrderSnapshot) {
        let attachment = self.attachment.lock();
        let Some(attachment) = attachment.as_ref() else {
            return;
        };
        let job = AnnounceJob {
            order,
            kitchen_load: *self.kitchen_load.read(),
        };
        match attachment.announce_tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(order_id = job.order.id, "Announce queue full, announcement dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Announce queue closed");
            }
        }
    }
}

/// The synchronization facade
///
/// Cheap to clone; clones share the same engine state.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
    sink: Arc<dyn AnnouncementSink>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("orders", &self.inner.partition.len())
            .field("epoch", &self.epoch())
            .finish()
    }
}

impl SyncEngine {
    /// Engine with the default (logging) announcement sink
    pub fn new(store: Arc<dyn OrderStore>, config: EngineConfig) -> Self {
        Self::with_sink(store, config, Arc::new(NullSink))
    }

    /// Engine with an explicit synthesis collaborator
    pub fn with_sink(
        store: Arc<dyn OrderStore>,
        config: EngineConfig,
        sink: Arc<dyn AnnouncementSink>,
    ) -> Self {
        let (change_tx, _) = broadcast::channel(config.change_hook_capacity);
        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                partition: PartitionStore::new(),
                mutations: MutationTable::new(),
                change_tx,
                kitchen_load: RwLock::new(KitchenLoad::Normal),
                attachment: Mutex::new(None),
            }),
            sink,
        }
    }

    /// Attach to the change feed
    ///
    /// Subscribes first, then bulk-fetches, so no event can fall between
    /// the two. Spawns the feed consumer and the announcement worker under
    /// a fresh epoch; a previous attachment is torn down first, which also
    /// resets the announcement rotation counters.
    pub async fn attach(&self) -> EngineResult<()> {
        self.detach();

        let feed_rx = self
            .inner
            .store
            .subscribe()
            .map_err(EngineError::FeedDisconnected)?;

        let epoch = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let (announce_tx, announce_rx) =
            mpsc::channel(self.inner.config.announce_queue_capacity);

        // Register the attachment before the initial fetch so announcement
        // dispatch is live the moment events start applying
        *self.inner.attachment.lock() = Some(Attachment {
            epoch: epoch.clone(),
            cancel: cancel.clone(),
            announce_tx,
        });

        self.inner.resync().await.inspect_err(|_| {
            *self.inner.attachment.lock() = None;
        })?;

        let worker = AnnounceWorker::new(self.sink.clone(), self.inner.config.clone());
        tokio::spawn(worker.run(announce_rx, cancel.clone()));

        let consumer = ChangeFeedConsumer::new(Arc::clone(&self.inner));
        tokio::spawn(consumer.run(feed_rx, cancel));

        tracing::info!(epoch = %epoch, "Engine attached");
        Ok(())
    }

    /// Detach from the change feed
    ///
    /// Cancels the workers and discards outstanding pending mutations.
    /// In-flight backing-store writes complete, but their results no longer
    /// touch engine state.
    pub fn detach(&self) {
        if let Some(attachment) = self.inner.attachment.lock().take() {
            tracing::info!(epoch = %attachment.epoch, "Engine detached");
        }
        self.inner.mutations.clear();
    }

    /// Whether the engine is currently attached
    pub fn is_attached(&self) -> bool {
        self.inner.attachment.lock().is_some()
    }

    /// Current attachment epoch, if attached
    pub fn epoch(&self) -> Option<String> {
        self.inner.attachment.lock().as_ref().map(|a| a.epoch.clone())
    }

    /// Request a status transition for an order
    ///
    /// Applies the change locally before store confirmation (optimistic),
    /// then issues the write. On store failure the local change is rolled
    /// back to the exact prior snapshot and [`EngineError::WriteFailed`] is
    /// returned - recoverable, the caller may re-issue. If an authoritative
    /// feed event for the same order lands before the write settles, the
    /// event wins and this write's outcome no longer touches engine state.
    pub async fn request_transition(&self, id: i64, status: OrderStatus) -> EngineResult<()> {
        if !self.is_attached() {
            return Err(EngineError::Detached);
        }
        let current = self
            .inner
            .partition
            .get(id)
            .ok_or(EngineError::OrderNotFound(id))?;
        self.check_transition(&current, status)?;

        let optimistic = current.with_status(status);
        let seq = self.inner.mutations.begin(id, status, current);
        let outcome = self.inner.partition.upsert(optimistic.clone());
        if outcome.changed {
            self.inner.notify(BucketChange::Order {
                id,
                stage: Some(outcome.stage),
                previous_stage: outcome.previous_stage,
            });
            if outcome.entered_new {
                self.inner.queue_announcement(optimistic.clone());
            }
        }
        tracing::debug!(order_id = id, status = %status, seq, "Optimistic transition applied");

        match self.inner.store.write_status(id, status).await {
            Ok(()) => {
                if self.inner.mutations.settle(id, seq).is_some() {
                    tracing::debug!(order_id = id, seq, "Transition confirmed by store");
                }
                Ok(())
            }
            Err(err) => {
                if let Some(pending) = self.inner.mutations.settle(id, seq) {
                    tracing::warn!(order_id = id, error = %err, "Write failed, rolling back optimistic transition");
                    let outcome = self.inner.partition.upsert(pending.prior);
                    if outcome.changed {
                        self.inner.notify(BucketChange::Order {
                            id,
                            stage: Some(outcome.stage),
                            previous_stage: outcome.previous_stage,
                        });
                    }
                }
                Err(EngineError::WriteFailed(err))
            }
        }
    }

    /// Lifecycle-ordering precondition for a transition
    fn check_transition(&self, current: &OrderSnapshot, to: OrderStatus) -> EngineResult<()> {
        let from_stage = current.status.stage();
        let to_stage = to.stage();

        // Forward and same-stage label changes are always allowed; the only
        // permitted reversal is ACTIVE -> NEW ("send back to queue") when
        // the domain opts in
        let allowed = to_stage.rank() >= from_stage.rank()
            || (from_stage == Stage::Active
                && to_stage == Stage::New
                && self.inner.config.allow_requeue);

        if allowed {
            Ok(())
        } else {
            Err(EngineError::TransitionRejected {
                from: current.status,
                from_stage,
                to,
                to_stage,
            })
        }
    }

    /// Immutable ordered view of a bucket, for rendering
    pub fn bucket(&self, stage: Stage) -> BucketView {
        self.inner.partition.bucket(stage)
    }

    /// Current snapshot of one order
    pub fn order(&self, id: i64) -> Option<OrderSnapshot> {
        self.inner.partition.get(id)
    }

    /// Total number of orders across all buckets
    pub fn order_count(&self) -> usize {
        self.inner.partition.len()
    }

    /// Subscribe to re-render notifications
    pub fn subscribe_changes(&self) -> broadcast::Receiver<BucketChange> {
        self.inner.change_tx.subscribe()
    }

    /// Report the ambient kitchen load (announcement context input)
    pub fn set_kitchen_load(&self, load: KitchenLoad) {
        *self.inner.kitchen_load.write() = load;
    }

    pub fn kitchen_load(&self) -> KitchenLoad {
        *self.inner.kitchen_load.read()
    }
}
