//! Delivery profiles - voice parameters per kitchen scenario
//!
//! Values are tuned for a noisy kitchen: lower pitch and slower rate for
//! intelligibility, volume stepped up with ambient load.

use serde::{Deserialize, Serialize};

/// Speech emphasis level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Emphasis {
    Strong,
    Moderate,
    Reduced,
}

/// Voice/delivery parameters handed to the synthesis collaborator
///
/// Outbound-only payload, hence no `Deserialize`: the engine never reads
/// profiles back.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryProfile {
    /// Profile identifier, e.g. "urgent"
    pub name: &'static str,
    pub language_code: &'static str,
    pub voice_name: &'static str,
    /// Speaking rate multiplier (1.0 = default)
    pub rate: f32,
    /// Pitch shift in semitones
    pub pitch: f32,
    /// Volume gain in dB
    pub volume_gain_db: f32,
    pub emphasis: Emphasis,
}

impl DeliveryProfile {
    /// Standard kitchen profile - clear and steady
    pub const STANDARD: DeliveryProfile = DeliveryProfile {
        name: "standard",
        language_code: "en-US",
        voice_name: "en-US-Wavenet-D",
        rate: 0.9,
        pitch: -2.0,
        volume_gain_db: 2.0,
        emphasis: Emphasis::Moderate,
    };

    /// Urgent orders - faster and attention-grabbing
    pub const URGENT: DeliveryProfile = DeliveryProfile {
        name: "urgent",
        language_code: "en-US",
        voice_name: "en-US-Wavenet-B",
        rate: 1.1,
        pitch: 2.0,
        volume_gain_db: 4.0,
        emphasis: Emphasis::Strong,
    };

    /// Busy kitchen - slower, clearer, louder
    pub const BUSY_KITCHEN: DeliveryProfile = DeliveryProfile {
        name: "busy_kitchen",
        language_code: "en-US",
        voice_name: "en-US-Wavenet-D",
        rate: 0.8,
        pitch: -1.0,
        volume_gain_db: 6.0,
        emphasis: Emphasis::Strong,
    };

    /// Quiet hours - softer and calmer
    pub const QUIET_HOURS: DeliveryProfile = DeliveryProfile {
        name: "quiet_hours",
        language_code: "en-US",
        voice_name: "en-US-Wavenet-F",
        rate: 0.85,
        pitch: -3.0,
        volume_gain_db: 1.0,
        emphasis: Emphasis::Reduced,
    };

    /// Large orders - measured pace so nothing is missed
    pub const LARGE_ORDER: DeliveryProfile = DeliveryProfile {
        name: "large_order",
        language_code: "en-US",
        voice_name: "en-US-Wavenet-D",
        rate: 0.75,
        pitch: -2.0,
        volume_gain_db: 3.0,
        emphasis: Emphasis::Moderate,
    };
}
