//! Announcement context - ephemeral situational inputs
//!
//! Computed fresh for every announcement decision, never persisted.

use chrono::Timelike;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::OrderSnapshot;

/// Time-of-day bucket in the business timezone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket for an hour of day (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Day,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Current bucket in the given timezone
    pub fn now(tz: Tz) -> Self {
        Self::from_hour(chrono::Utc::now().with_timezone(&tz).hour())
    }
}

/// Ambient kitchen load, reported by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenLoad {
    Busy,
    #[default]
    Normal,
    Quiet,
}

/// Order-size bucket derived from the item count
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSize {
    Small,
    Medium,
    Large,
}

impl OrderSize {
    /// Classify an item count; `large_threshold` is the highest count that
    /// still counts as medium
    pub fn classify(count: usize, large_threshold: usize) -> Self {
        if count <= 2 {
            OrderSize::Small
        } else if count <= large_threshold {
            OrderSize::Medium
        } else {
            OrderSize::Large
        }
    }
}

/// Rush markers recognized in the order note
const URGENT_MARKERS: &[&str] = &["urgent", "rush", "asap"];

/// Situational flags for one announcement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnouncementContext {
    pub urgent: bool,
    pub time_of_day: TimeOfDay,
    pub kitchen_load: KitchenLoad,
    pub order_size: OrderSize,
}

impl AnnouncementContext {
    /// Derive the context for an order
    ///
    /// The caller supplies the time bucket and ambient load; urgency comes
    /// from a rush marker in the order note - the row schema has no
    /// priority column, so the note is the integration point.
    pub fn for_order(
        order: &OrderSnapshot,
        load: KitchenLoad,
        time_of_day: TimeOfDay,
        large_order_threshold: usize,
    ) -> Self {
        Self {
            urgent: order
                .note
                .as_deref()
                .map(|n| {
                    let n = n.to_ascii_lowercase();
                    URGENT_MARKERS.iter().any(|m| n.contains(m))
                })
                .unwrap_or(false),
            time_of_day,
            kitchen_load: load,
            order_size: OrderSize::classify(order.item_count(), large_order_threshold),
        }
    }
}
