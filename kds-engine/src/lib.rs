//! KDS Engine - Order lifecycle synchronization and announcement
//!
//! # Architecture Overview
//!
//! The engine keeps a kitchen display's view of the order set converged
//! with the backing store while staying responsive to local actions:
//!
//! ```text
//! Backing store (OrderStore)
//!        │ change feed (broadcast)
//!        ▼
//! ChangeFeedConsumer ──┐
//!                      ├──► PartitionStore ──► bucket views (UI)
//! Coordinator ─────────┘          │
//! (optimistic writes)             └──► mpsc ──► AnnounceWorker ──► AnnouncementSink
//! ```
//!
//! Two producers feed the partition store: the change-feed consumer (the
//! authoritative writer) and the optimistic mutation coordinator (local
//! status changes applied before store confirmation, reconciled against the
//! feed). Announcement dispatch is fire-and-forget relative to bucket state,
//! so slow audio work can never delay convergence.
//!
//! # Module Structure
//!
//! ```text
//! kds-engine/src/
//! ├── core/        # Config, errors
//! ├── store/       # Backing-store seam + in-process memory store
//! ├── partition/   # Lifecycle buckets (copy-on-write views)
//! ├── sync/        # Feed consumer, optimistic coordinator
//! ├── announce/    # Context, profiles, templates, orchestrator, worker
//! ├── engine.rs    # SyncEngine facade (the public surface)
//! └── utils/       # Logging setup
//! ```

pub mod announce;
pub mod core;
pub mod engine;
pub mod partition;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export public types
pub use announce::{
    AnnouncementContext, AnnouncementSink, DeliveryProfile, KitchenLoad, NullSink, OrderSize,
    TimeOfDay,
};
pub use core::{EngineConfig, EngineError, EngineResult, StoreError};
pub use engine::{BucketChange, SyncEngine};
pub use partition::{BucketView, PartitionStore, UpsertOutcome};
pub use store::{MemoryStore, OrderStore, StageFilter};

// Re-export shared model types for convenience
pub use shared::{ChangeEvent, ChangeKind, OrderRow, OrderSnapshot, OrderStatus, Stage};
