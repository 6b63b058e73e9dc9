//! Shared domain types for the kitchen display system
//!
//! This crate holds the data model exchanged between the backing store,
//! the synchronization engine and its consumers:
//!
//! - **order**: order snapshots, the status vocabulary and its lifecycle
//!   stages, and row-level change-feed events
//! - **util**: small time helpers
//!
//! Everything here is a plain value type: snapshots are immutable and
//! every mutation produces a new snapshot, so concurrent readers never
//! observe a half-updated order.

pub mod order;
pub mod util;

// Re-export the core model at the crate root
pub use order::{ChangeEvent, ChangeKind, OrderRow, OrderSnapshot, OrderStatus, Stage};
