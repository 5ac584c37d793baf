//! The two recognition cadences.
//!
//! [`PromotionCadence`] moves one absent identity to present per tick;
//! [`FeedCadence`] samples any roster member for the live feed and never
//! looks at presence. Both are pure selection plus event construction:
//! the caller owns the roster, presence and event log and applies the
//! side effects. The two run on separate periods and are not
//! synchronized with each other.

use crate::clock::Clock;
use crate::presence::PresenceSet;
use crate::random::RandomSource;
use crate::types::{ConfidencePolicy, EventSource, Identity, RecognitionEvent, UniformConfidence};
use std::time::Duration;

pub const DEFAULT_PROMOTION_PERIOD: Duration = Duration::from_secs(8);
pub const DEFAULT_FEED_PERIOD: Duration = Duration::from_secs(10);

fn build_event<P: ConfidencePolicy>(
    policy: &P,
    identity: &Identity,
    source: EventSource,
    rng: &mut dyn RandomSource,
    clock: &dyn Clock,
) -> RecognitionEvent {
    RecognitionEvent {
        identity_id: identity.id.clone(),
        timestamp: clock.now(),
        confidence: policy.score(rng),
        source,
    }
}

/// Gradual roster recognition: one not-yet-present identity per tick.
#[derive(Debug, Clone)]
pub struct PromotionCadence<P = UniformConfidence> {
    pub period: Duration,
    policy: P,
}

impl PromotionCadence {
    pub fn new(period: Duration) -> Self {
        Self::with_policy(period, UniformConfidence)
    }
}

impl<P: ConfidencePolicy> PromotionCadence<P> {
    pub fn with_policy(period: Duration, policy: P) -> Self {
        Self { period, policy }
    }

    /// Pick one absent identity uniformly at random.
    ///
    /// Returns `None` when the roster is empty or everyone is already
    /// present. The caller must mark the returned identity present.
    pub fn advance(
        &self,
        roster: &[Identity],
        present: &PresenceSet,
        rng: &mut dyn RandomSource,
        clock: &dyn Clock,
    ) -> Option<RecognitionEvent> {
        let candidates: Vec<&Identity> = present.absent_in(roster).collect();
        if candidates.is_empty() {
            return None;
        }
        let chosen = candidates[rng.pick_index(candidates.len())];
        Some(build_event(&self.policy, chosen, EventSource::Promotion, rng, clock))
    }
}

/// Display feed: any roster member per tick, presence ignored.
#[derive(Debug, Clone)]
pub struct FeedCadence<P = UniformConfidence> {
    pub period: Duration,
    policy: P,
}

impl FeedCadence {
    pub fn new(period: Duration) -> Self {
        Self::with_policy(period, UniformConfidence)
    }
}

impl<P: ConfidencePolicy> FeedCadence<P> {
    pub fn with_policy(period: Duration, policy: P) -> Self {
        Self { period, policy }
    }

    /// Pick any roster member uniformly at random. `None` on an empty roster.
    pub fn advance(
        &self,
        roster: &[Identity],
        rng: &mut dyn RandomSource,
        clock: &dyn Clock,
    ) -> Option<RecognitionEvent> {
        if roster.is_empty() {
            return None;
        }
        let chosen = &roster[rng.pick_index(roster.len())];
        Some(build_event(&self.policy, chosen, EventSource::Feed, rng, clock))
    }
}
