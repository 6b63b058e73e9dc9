//! Message templates with per-rule rotation
//!
//! Each rule bucket carries a list of template variants. Selection within a
//! bucket is round-robin (a per-bucket counter modulo the variant count) so
//! repeated announcements in the same context are not verbatim duplicates.
//!
//! Placeholders: `{items}`, `{table}`, `{price}`, `{note}`.

use shared::OrderSnapshot;

/// Template variants for one rule bucket
#[derive(Debug, Clone)]
pub struct TemplateSet {
    variants: &'static [&'static str],
}

impl TemplateSet {
    pub const fn new(variants: &'static [&'static str]) -> Self {
        Self { variants }
    }

    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Variant at a rotation index (callers pass the per-bucket counter)
    pub fn variant(&self, index: usize) -> &'static str {
        self.variants[index % self.variants.len()]
    }
}

pub const STANDARD_TEMPLATES: TemplateSet = TemplateSet::new(&[
    "New order for {table}... {items}. {price}",
    "Order up for {table}: {items}. {price}",
]);

pub const URGENT_TEMPLATES: TemplateSet = TemplateSet::new(&[
    "Rush order! {items} for {table} - priority!",
    "Priority order! {table} needs {items} now!",
]);

pub const BUSY_TEMPLATES: TemplateSet = TemplateSet::new(&[
    "Kitchen alert! {items} for {table}",
    "Heads up - {items} for {table}",
]);

pub const LARGE_ORDER_TEMPLATES: TemplateSet = TemplateSet::new(&[
    "Big order coming in... {items} for {table}",
    "Large order for {table}: {items}",
]);

pub const QUIET_TEMPLATES: TemplateSet = TemplateSet::new(&[
    "Gentle reminder... {items} for {table}",
    "New order in: {items} for {table}",
]);

/// Fill a template's placeholders from an order snapshot
///
/// The note clause is appended only when a non-blank note exists, matching
/// the display formatter's behavior.
pub fn format_message(template: &str, order: &OrderSnapshot) -> String {
    let price = format!("{:.2}", order.price);
    let mut message = template
        .replace("{items}", order.name.trim())
        .replace("{table}", order.table_no.trim())
        .replace("{price}", &price);

    if let Some(note) = order.note.as_deref()
        && message.contains("{note}")
    {
        message = message.replace("{note}", note.trim());
    } else {
        message = message.replace("{note}", "");
    }

    if order.has_note() && !template.contains("{note}") {
        message.push_str(&format!(" With order note: {}", order.note.as_deref().unwrap_or_default().trim()));
    }

    message.trim().to_string()
}
