//! Backing-store seam
//!
//! The persistent order store is an external collaborator; the engine only
//! depends on this trait. Real deployments wrap the hosted store's client,
//! tests use [`MemoryStore`]. Rows cross this boundary raw - status
//! normalization is the engine's job, so a store speaking the legacy label
//! schema needs no adapter.

pub mod memory;

pub use memory::MemoryStore;

use crate::core::StoreError;
use async_trait::async_trait;
use shared::{ChangeEvent, OrderRow, OrderStatus, Stage};
use tokio::sync::broadcast;

/// Stage filter for bulk fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    /// Every order the store considers live for display
    All,
    /// Only orders whose normalized status maps to the given stage
    Stage(Stage),
}

impl StageFilter {
    /// Whether a raw status label passes this filter
    pub fn matches(self, raw_status: Option<&str>) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Stage(stage) => OrderStatus::normalize(raw_status).stage() == stage,
        }
    }
}

/// Backing order store
///
/// The change feed delivers at-least-once, possibly duplicated, possibly
/// reordered row events and nothing stronger. Dropping the receiver
/// returned by [`OrderStore::subscribe`] unsubscribes.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Bulk fetch of order rows, newest first
    async fn fetch_bucket(&self, filter: StageFilter) -> Result<Vec<OrderRow>, StoreError>;

    /// Persist a status change for one order
    async fn write_status(&self, id: i64, status: OrderStatus) -> Result<(), StoreError>;

    /// Subscribe to the row-level change feed
    fn subscribe(&self) -> Result<broadcast::Receiver<ChangeEvent>, StoreError>;
}
