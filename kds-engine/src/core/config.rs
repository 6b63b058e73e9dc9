use chrono_tz::Tz;

/// Engine configuration
///
/// # Environment variables
///
/// All settings can be overridden via environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | KDS_TIMEZONE | Europe/Madrid | Business timezone for time-of-day bucketing |
/// | ALLOW_REQUEUE | false | Permit ACTIVE → NEW "send back to queue" transitions |
/// | LARGE_ORDER_THRESHOLD | 4 | Item count above which an order announces as large |
/// | TIME_BASED_PROFILES | true | Let the clock pick quiet-hours announcement delivery |
/// | ANNOUNCE_QUEUE_CAPACITY | 64 | Announcement dispatch queue size (best-effort) |
/// | CHANGE_HOOK_CAPACITY | 256 | Re-render notification channel size |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Business timezone, used for announcement time-of-day buckets
    pub timezone: Tz,
    /// Whether ACTIVE → NEW reversals ("send back to queue") are permitted
    pub allow_requeue: bool,
    /// Item count above which an order counts as large for announcements
    pub large_order_threshold: usize,
    /// Whether the time of day may select the quiet-hours delivery profile;
    /// when off, only an explicitly reported quiet kitchen does
    pub time_based_profiles: bool,
    /// Announcement queue capacity; dispatch is best-effort beyond this
    pub announce_queue_capacity: usize,
    /// Re-render notification channel capacity
    pub change_hook_capacity: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            timezone: std::env::var("KDS_TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Europe::Madrid),
            allow_requeue: std::env::var("ALLOW_REQUEUE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            large_order_threshold: std::env::var("LARGE_ORDER_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            time_based_profiles: std::env::var("TIME_BASED_PROFILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            announce_queue_capacity: std::env::var("ANNOUNCE_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            change_hook_capacity: std::env::var("CHANGE_HOOK_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
        }
    }

    /// Override the requeue policy
    ///
    /// Mostly used in tests.
    pub fn with_requeue(mut self, allow: bool) -> Self {
        self.allow_requeue = allow;
        self
    }

    /// Override the business timezone
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Override whether the clock may pick quiet-hours delivery
    pub fn with_time_based_profiles(mut self, enabled: bool) -> Self {
        self.time_based_profiles = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_env();
        assert_eq!(config.large_order_threshold, 4);
        assert!(config.announce_queue_capacity > 0);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_env()
            .with_requeue(true)
            .with_timezone(chrono_tz::UTC);
        assert!(config.allow_requeue);
        assert_eq!(config.timezone, chrono_tz::UTC);
    }
}
