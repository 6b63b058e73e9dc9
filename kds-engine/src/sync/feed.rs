//! Change feed consumer - the authoritative writer
//!
//! Long-lived task subscribed to the backing store's row-level events.
//! Every event is normalized and applied as authoritative-as-of-arrival:
//! the last applied event for an id wins, regardless of the event's own
//! timestamps, and any pending local mutation for that id is discarded.
//!
//! The feed guarantees nothing beyond at-least-once delivery. Duplicates
//! are absorbed by idempotent upsert/remove. A lagging receiver means
//! events were missed and missed events are undetectable, so the consumer
//! falls back to a full resynchronization instead of patching.

use crate::engine::EngineInner;
use shared::{ChangeEvent, ChangeKind, OrderSnapshot};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Feed consumer worker
pub(crate) struct ChangeFeedConsumer {
    inner: Arc<EngineInner>,
}

impl ChangeFeedConsumer {
    pub(crate) fn new(inner: Arc<EngineInner>) -> Self {
        Self { inner }
    }

    /// Run until shutdown, the feed closes for good, or resync fails
    pub(crate) async fn run(
        self,
        mut feed_rx: broadcast::Receiver<ChangeEvent>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("Change feed consumer started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Change feed consumer received shutdown signal");
                    break;
                }
                event = feed_rx.recv() => {
                    match event {
                        Ok(event) => self.apply(event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Change feed lagged, resynchronizing from store");
                            if let Err(err) = self.inner.resync().await {
                                tracing::error!(error = %err, "Resynchronization failed, consumer stopping");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!("Change feed closed, attempting to resubscribe");
                            match self.inner.store.subscribe() {
                                Ok(rx) => {
                                    feed_rx = rx;
                                    if let Err(err) = self.inner.resync().await {
                                        tracing::error!(error = %err, "Resynchronization failed, consumer stopping");
                                        break;
                                    }
                                }
                                Err(err) => {
                                    tracing::error!(error = %err, "Feed disconnected for good, consumer stopping");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Apply one event to the partition store
    ///
    /// Bucket mutation is synchronous and deterministic; announcement
    /// dispatch (inside `apply_authoritative`) is queued fire-and-forget,
    /// so a slow sink can never leave rendering stale.
    fn apply(&self, event: ChangeEvent) {
        match event.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let Some(row) = event.new else {
                    tracing::warn!(kind = ?event.kind, "Event without new row, ignored");
                    return;
                };
                self.inner.apply_authoritative(OrderSnapshot::from_row(row));
            }
            ChangeKind::Delete => {
                let Some(row) = event.old else {
                    tracing::warn!("Delete event without old row, ignored");
                    return;
                };
                self.inner.apply_removal(row.id);
            }
        }
    }
}
