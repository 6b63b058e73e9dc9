//! Announcement decision - rule selection and rotation
//!
//! Rules are evaluated in fixed priority order; the first match wins and
//! rules never combine:
//!
//! 1. urgent order            → urgent profile + urgent template
//! 2. busy kitchen            → busy profile + busy template
//! 3. large order             → large-order profile + large-order template
//! 4. night or quiet kitchen  → quiet-hours profile + quiet template
//! 5. otherwise               → standard profile + standard template
//!
//! The orchestrator owns the per-rule rotation counters exclusively; they
//! live for the attachment and are reset when the engine re-attaches.

use super::context::{AnnouncementContext, KitchenLoad, OrderSize, TimeOfDay};
use super::profiles::DeliveryProfile;
use super::templates::{
    self, BUSY_TEMPLATES, LARGE_ORDER_TEMPLATES, QUIET_TEMPLATES, STANDARD_TEMPLATES,
    TemplateSet, URGENT_TEMPLATES,
};
use shared::OrderSnapshot;
use std::collections::HashMap;

/// Rule bucket an announcement decision landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleBucket {
    Urgent,
    Busy,
    LargeOrder,
    QuietHours,
    Standard,
}

impl RuleBucket {
    fn templates(self) -> &'static TemplateSet {
        match self {
            RuleBucket::Urgent => &URGENT_TEMPLATES,
            RuleBucket::Busy => &BUSY_TEMPLATES,
            RuleBucket::LargeOrder => &LARGE_ORDER_TEMPLATES,
            RuleBucket::QuietHours => &QUIET_TEMPLATES,
            RuleBucket::Standard => &STANDARD_TEMPLATES,
        }
    }

    fn profile(self) -> DeliveryProfile {
        match self {
            RuleBucket::Urgent => DeliveryProfile::URGENT,
            RuleBucket::Busy => DeliveryProfile::BUSY_KITCHEN,
            RuleBucket::LargeOrder => DeliveryProfile::LARGE_ORDER,
            RuleBucket::QuietHours => DeliveryProfile::QUIET_HOURS,
            RuleBucket::Standard => DeliveryProfile::STANDARD,
        }
    }
}

/// Pick the rule bucket for a context (pure; first matching rule wins)
pub fn select_rule(context: &AnnouncementContext) -> RuleBucket {
    if context.urgent {
        RuleBucket::Urgent
    } else if context.kitchen_load == KitchenLoad::Busy {
        RuleBucket::Busy
    } else if context.order_size == OrderSize::Large {
        RuleBucket::LargeOrder
    } else if context.time_of_day == TimeOfDay::Night || context.kitchen_load == KitchenLoad::Quiet
    {
        RuleBucket::QuietHours
    } else {
        RuleBucket::Standard
    }
}

/// A fully decided announcement, ready for the synthesis collaborator
#[derive(Debug, Clone)]
pub struct Announcement {
    pub order_id: i64,
    pub message: String,
    pub profile: DeliveryProfile,
    pub rule: RuleBucket,
}

/// Decision function plus rotation state
///
/// Not shared: owned by the announcement worker, mutated from one task.
pub struct AnnouncementOrchestrator {
    rotation: HashMap<RuleBucket, usize>,
}

impl Default for AnnouncementOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnouncementOrchestrator {
    pub fn new() -> Self {
        Self {
            rotation: HashMap::new(),
        }
    }

    /// Decide profile and message for one qualifying order
    ///
    /// Deterministic given (context, rotation state); each call advances
    /// the matched rule's rotation counter by one, modulo its variant
    /// count, so consecutive same-context announcements cycle variants.
    pub fn decide(&mut self, order: &OrderSnapshot, context: &AnnouncementContext) -> Announcement {
        let rule = select_rule(context);
        let set = rule.templates();

        let counter = self.rotation.entry(rule).or_insert(0);
        let template = set.variant(*counter);
        *counter = (*counter + 1) % set.variant_count();

        let message = templates::format_message(template, order);
        tracing::debug!(
            order_id = order.id,
            rule = ?rule,
            profile = %rule.profile().name,
            "Announcement decided"
        );

        Announcement {
            order_id: order.id,
            message,
            profile: rule.profile(),
            rule,
        }
    }

    /// Current rotation counter for a rule bucket
    pub fn rotation(&self, rule: RuleBucket) -> usize {
        self.rotation.get(&rule).copied().unwrap_or(0)
    }
}
