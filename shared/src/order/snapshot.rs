//! Order rows and snapshots
//!
//! [`OrderRow`] is the wire shape: what the backing store actually returns,
//! status as a free-form label that may follow either schema or be missing.
//! [`OrderSnapshot`] is the engine's value type: status normalized into the
//! closed vocabulary. Normalization happens exactly once, at the
//! collaborator boundary, via [`OrderSnapshot::from_row`].

use super::status::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw order row as delivered by the backing store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRow {
    pub id: i64,
    /// Display items text, e.g. "1 jollof, 1 chicken"
    pub name: String,
    /// Table designator, e.g. "Table 4" or "Takeaway"
    pub table_no: String,
    /// Order total in currency unit
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Raw status label; may be legacy-schema, unknown or absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Order snapshot - immutable value view inside the engine
///
/// Snapshots are never mutated in place: every change produces a new
/// snapshot via [`OrderSnapshot::with_status`], so readers holding an old
/// one keep a consistent view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Row id (unique, stable for the order's lifetime)
    pub id: i64,
    pub name: String,
    pub table_no: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Normalized status; bucketing derives from `status.stage()`
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl OrderSnapshot {
    /// Normalize a raw row into the closed vocabulary
    pub fn from_row(row: OrderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            table_no: row.table_no,
            price: row.price,
            note: row.note,
            status: OrderStatus::normalize(row.status.as_deref()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Back to the wire shape, canonical label
    pub fn into_row(self) -> OrderRow {
        OrderRow {
            id: self.id,
            name: self.name,
            table_no: self.table_no,
            price: self.price,
            note: self.note,
            status: Some(self.status.as_str().to_string()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// New snapshot with a different status, stamped with the current time
    ///
    /// All other fields are carried over unchanged.
    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            updated_at: Some(crate::util::now_iso()),
            ..self.clone()
        }
    }

    /// Number of line items, derived from the display text
    ///
    /// Items are comma-separated in `name`; an empty text counts as zero.
    pub fn item_count(&self) -> usize {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return 0;
        }
        trimmed.split(',').filter(|s| !s.trim().is_empty()).count()
    }

    /// Whether the note is present and non-blank
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

impl From<OrderRow> for OrderSnapshot {
    fn from(row: OrderRow) -> Self {
        Self::from_row(row)
    }
}
