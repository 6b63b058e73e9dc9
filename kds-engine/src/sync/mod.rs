//! Synchronization: the two producers feeding the partition store
//!
//! - **feed**: the change-feed consumer, the authoritative writer
//! - **coordinator**: bookkeeping for optimistic local mutations and their
//!   reconciliation against store confirmations and feed events
//!
//! Per-order reconciliation follows one rule: the store's view is
//! authoritative over an in-flight, unconfirmed local guess. A feed event
//! for an id discards that id's pending mutation; a pending mutation's
//! write callback only acts if its sequence number is still current.

pub mod coordinator;
pub mod feed;

pub use coordinator::{MutationTable, PendingMutation};
