//! Order status vocabulary and lifecycle stages
//!
//! Two incompatible raw vocabularies exist in the wild: the legacy schema
//! (`incoming` / `processing` / `complete`) and the current one
//! (`PENDING` / `IN_PROGRESS` / `COMPLETED` / `REJECTED`). The current
//! schema is canonical; [`OrderStatus::normalize`] folds the legacy labels
//! in at the collaborator boundary so schema drift stays in one place.

use serde::{Deserialize, Serialize};

/// Coarse lifecycle stage used for bucketing
///
/// Stages form a strict forward order: `New → Active → Terminal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Newly actionable: waiting for the kitchen to pick it up
    New,
    /// Being prepared
    Active,
    /// Finished, one way or the other
    Terminal,
}

impl Stage {
    /// All stages in lifecycle order
    pub const ALL: [Stage; 3] = [Stage::New, Stage::Active, Stage::Terminal];

    /// Position in the lifecycle order (0 = New)
    pub fn rank(self) -> u8 {
        match self {
            Stage::New => 0,
            Stage::Active => 1,
            Stage::Terminal => 2,
        }
    }
}

/// Order status (closed vocabulary)
///
/// The raw label is preserved in snapshots - display logic may distinguish
/// `Completed` from `Rejected` even though both are [`Stage::Terminal`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl OrderStatus {
    /// Lifecycle stage this status belongs to
    pub fn stage(self) -> Stage {
        match self {
            OrderStatus::Pending => Stage::New,
            OrderStatus::InProgress => Stage::Active,
            OrderStatus::Completed | OrderStatus::Rejected => Stage::Terminal,
        }
    }

    /// Map a raw status label to the closed vocabulary
    ///
    /// Total function: unrecognized or missing input maps to the initial
    /// `Pending` status. Matching is case-insensitive and accepts both the
    /// canonical and the legacy schema labels.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return OrderStatus::Pending;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "incoming" => OrderStatus::Pending,
            "in_progress" | "in-progress" | "processing" => OrderStatus::InProgress,
            "completed" | "complete" | "done" => OrderStatus::Completed,
            "rejected" | "cancelled" => OrderStatus::Rejected,
            other => {
                tracing::debug!(raw = %other, "Unrecognized status label, defaulting to PENDING");
                OrderStatus::Pending
            }
        }
    }

    /// Raw label as stored in snapshots
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
