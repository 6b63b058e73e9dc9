//! Announcement dispatch worker
//!
//! Drains the announcement queue and hands work to the synthesis
//! collaborator. Runs on its own task so slow audio never delays bucket
//! state; the feed consumer enqueues with `try_send` and drops on overflow.

use super::context::{AnnouncementContext, KitchenLoad, TimeOfDay};
use super::orchestrator::AnnouncementOrchestrator;
use crate::core::EngineConfig;
use async_trait::async_trait;
use shared::OrderSnapshot;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// External synthesis/playback collaborator
///
/// Fire-and-forget: errors are the collaborator's to log and degrade on;
/// they are never propagated back to bucket-state callers.
#[async_trait]
pub trait AnnouncementSink: Send + Sync + 'static {
    async fn announce(&self, message: &str, profile: &super::profiles::DeliveryProfile);
}

/// Default sink: logs the announcement instead of speaking it
pub struct NullSink;

#[async_trait]
impl AnnouncementSink for NullSink {
    async fn announce(&self, message: &str, profile: &super::profiles::DeliveryProfile) {
        tracing::info!(profile = %profile.name, message = %message, "Announcement (no sink configured)");
    }
}

/// Work item queued by the feed consumer / coordinator
#[derive(Debug, Clone)]
pub struct AnnounceJob {
    pub order: OrderSnapshot,
    /// Ambient load sampled when the job was queued
    pub kitchen_load: KitchenLoad,
}

/// Announcement worker
///
/// Owns the orchestrator (and with it the rotation counters) for the
/// lifetime of one engine attachment.
pub struct AnnounceWorker {
    sink: std::sync::Arc<dyn AnnouncementSink>,
    orchestrator: AnnouncementOrchestrator,
    config: EngineConfig,
}

impl AnnounceWorker {
    pub fn new(sink: std::sync::Arc<dyn AnnouncementSink>, config: EngineConfig) -> Self {
        Self {
            sink,
            orchestrator: AnnouncementOrchestrator::new(),
            config,
        }
    }

    /// Run until the queue closes or shutdown is signalled
    pub async fn run(mut self, mut rx: mpsc::Receiver<AnnounceJob>, shutdown: CancellationToken) {
        tracing::info!("Announce worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Announce worker received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Announce queue closed, worker stopping");
                        break;
                    };
                    self.handle(job).await;
                }
            }
        }
    }

    async fn handle(&mut self, job: AnnounceJob) {
        // With time-based profiles off, only an explicitly quiet kitchen
        // can select the quiet-hours delivery
        let time_of_day = if self.config.time_based_profiles {
            TimeOfDay::now(self.config.timezone)
        } else {
            TimeOfDay::Day
        };
        let context = AnnouncementContext::for_order(
            &job.order,
            job.kitchen_load,
            time_of_day,
            self.config.large_order_threshold,
        );
        let announcement = self.orchestrator.decide(&job.order, &context);
        tracing::debug!(
            order_id = announcement.order_id,
            profile = %announcement.profile.name,
            "Dispatching announcement"
        );
        // Sink failures stay inside the collaborator; nothing to unwind here
        self.sink
            .announce(&announcement.message, &announcement.profile)
            .await;
    }
}
