use crate::random::RandomSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest synthetic confidence score, in percent.
pub const CONFIDENCE_FLOOR: u8 = 70;
/// Width of the synthetic confidence range: scores are `floor(70 + u * 29)`.
pub const CONFIDENCE_SPAN: u8 = 29;
/// Upper bound any generated score stays within.
pub const CONFIDENCE_CEILING: u8 = 99;

/// An enrolled person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub role: String,
    pub photo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Free-form display label ("Yesterday, 5:30 PM", "Never"). Never parsed.
    pub last_seen: String,
}

/// Which cadence produced a recognition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Roster promotion: the identity moved from absent to present.
    Promotion,
    /// Feed sampling: display-only event, presence untouched.
    Feed,
}

/// One simulated detection. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Weak reference: the identity may have been removed since.
    pub identity_id: String,
    pub timestamp: DateTime<Utc>,
    /// Synthetic match score in percent, within [70, 99].
    pub confidence: u8,
    pub source: EventSource,
}

/// Strategy for scoring a simulated recognition.
pub trait ConfidencePolicy {
    fn score(&self, rng: &mut dyn RandomSource) -> u8;
}

/// Uniform integer score over `floor(70 + u * 29)`, `u` in [0, 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformConfidence;

impl ConfidencePolicy for UniformConfidence {
    fn score(&self, rng: &mut dyn RandomSource) -> u8 {
        let u = rng.next_unit();
        let raw = (f64::from(CONFIDENCE_FLOOR) + u * f64::from(CONFIDENCE_SPAN)).floor();
        // A misbehaving source could hand back values outside [0, 1).
        raw.clamp(f64::from(CONFIDENCE_FLOOR), f64::from(CONFIDENCE_CEILING)) as u8
    }
}
