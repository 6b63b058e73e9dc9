//! Engine error types
//!
//! Nothing here is fatal to the process: every failure path degrades to
//! "state matches the last-known-good store view" plus an error signal to
//! the caller.

use shared::{OrderStatus, Stage};
use thiserror::Error;

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Backing-store collaborator failure
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Write was rejected or lost by the store
    #[error("store write failed: {0}")]
    WriteFailed(String),
    /// Bulk fetch failed
    #[error("store fetch failed: {0}")]
    FetchFailed(String),
    /// The change-feed subscription cannot be (re)established
    #[error("subscription unavailable: {0}")]
    SubscriptionUnavailable(String),
}

/// Engine-level errors surfaced to callers
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Requested transition violates the lifecycle stage ordering.
    /// Reported synchronously; no state was changed.
    #[error("transition rejected: {from} ({from_stage:?}) -> {to} ({to_stage:?})")]
    TransitionRejected {
        from: OrderStatus,
        from_stage: Stage,
        to: OrderStatus,
        to_stage: Stage,
    },

    /// The order is not known to the engine
    #[error("order {0} not found")]
    OrderNotFound(i64),

    /// The backing-store write for a locally-applied transition failed.
    /// The optimistic change has been rolled back; the caller may retry
    /// by re-issuing the transition.
    #[error("write failed (rolled back): {0}")]
    WriteFailed(#[source] StoreError),

    /// Operation requires an attached engine
    #[error("engine is detached")]
    Detached,

    /// The change feed was lost and could not be re-established
    #[error("change feed disconnected: {0}")]
    FeedDisconnected(#[source] StoreError),
}

impl EngineError {
    /// Whether the caller can reasonably retry the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::WriteFailed(_) | EngineError::FeedDisconnected(_)
        )
    }
}
