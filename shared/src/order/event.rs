//! Row-level change-feed events
//!
//! The backing store delivers at-least-once, possibly duplicated and
//! possibly reordered notifications of row changes. Nothing stronger is
//! assumed: consumers must treat every event as authoritative-as-of-arrival
//! and apply it idempotently. Payloads are raw [`OrderRow`]s - status
//! normalization is the consumer's job.

use super::snapshot::OrderRow;
use serde::{Deserialize, Serialize};

/// Kind of row change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single change-feed notification
///
/// `new` is present for INSERT/UPDATE, `old` for UPDATE/DELETE. The feed
/// does not guarantee either beyond that, so accessors are defensive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<OrderRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<OrderRow>,
}

impl ChangeEvent {
    pub fn insert(row: OrderRow) -> Self {
        Self {
            kind: ChangeKind::Insert,
            new: Some(row),
            old: None,
        }
    }

    pub fn update(old: OrderRow, new: OrderRow) -> Self {
        Self {
            kind: ChangeKind::Update,
            new: Some(new),
            old: Some(old),
        }
    }

    pub fn delete(old: OrderRow) -> Self {
        Self {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(old),
        }
    }

    /// Id of the affected row, whichever side carries it
    pub fn order_id(&self) -> Option<i64> {
        self.new
            .as_ref()
            .map(|r| r.id)
            .or_else(|| self.old.as_ref().map(|r| r.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn row(id: i64, status: Option<&str>) -> OrderRow {
        OrderRow {
            id,
            name: "1 waakye".to_string(),
            table_no: "Table 1".to_string(),
            price: Decimal::new(1000, 2),
            note: None,
            status: status.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_order_id_prefers_new_side() {
        let ev = ChangeEvent::update(row(1, Some("pending")), row(1, Some("processing")));
        assert_eq!(ev.order_id(), Some(1));

        let ev = ChangeEvent::delete(row(2, None));
        assert_eq!(ev.order_id(), Some(2));

        let ev = ChangeEvent {
            kind: ChangeKind::Update,
            new: None,
            old: None,
        };
        assert_eq!(ev.order_id(), None);
    }

    #[test]
    fn test_event_serde_round_trip() {
        let ev = ChangeEvent::insert(row(3, Some("incoming")));
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"INSERT\""));
        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.order_id(), Some(3));
        assert_eq!(back.kind, ChangeKind::Insert);
        assert_eq!(back.new.unwrap().status.as_deref(), Some("incoming"));
    }
}
