//! Announcement orchestration
//!
//! Decides whether and how a newly actionable order is announced, then
//! hands the formatted message to the external synthesis collaborator.
//!
//! ```text
//! entered-NEW upsert ──► mpsc (try_send) ──► AnnounceWorker
//!                                               │ decide(context)
//!                                               │ format(template)
//!                                               ▼
//!                                        AnnouncementSink (fire-and-forget)
//! ```
//!
//! Dispatch is decoupled from bucket mutation: state updates complete
//! synchronously, the announcement queue is drained by its own worker, and
//! a synthesis failure is logged without ever reaching state callers.

pub mod context;
pub mod orchestrator;
pub mod profiles;
pub mod templates;
pub mod worker;

pub use context::{AnnouncementContext, KitchenLoad, OrderSize, TimeOfDay};
pub use orchestrator::{AnnouncementOrchestrator, RuleBucket};
pub use profiles::DeliveryProfile;
pub use templates::TemplateSet;
pub use worker::{AnnounceJob, AnnounceWorker, AnnouncementSink, NullSink};
