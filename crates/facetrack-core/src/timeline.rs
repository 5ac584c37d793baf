//! Logical-time driver for a [`Session`].
//!
//! Replays both cadences against a [`ManualClock`] without real timers.
//! Each cadence fires every `period` after the timeline starts; when both
//! are due at the same instant the promotion tick runs first.

use crate::clock::ManualClock;
use crate::random::RandomSource;
use crate::session::Session;
use crate::types::RecognitionEvent;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Timeline {
    elapsed: Duration,
    next_promotion: Duration,
    next_feed: Duration,
}

impl Timeline {
    pub fn for_session(session: &Session) -> Self {
        Self {
            elapsed: Duration::ZERO,
            next_promotion: session.promotion_period(),
            next_feed: session.feed_period(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advance logical time by `span`, firing every tick that falls due.
    ///
    /// Returns the events produced, oldest first. A span that would carry
    /// logical time past `Duration::MAX` fires nothing and leaves the
    /// timeline where it was.
    pub fn run_for(
        &mut self,
        span: Duration,
        session: &mut Session,
        rng: &mut dyn RandomSource,
        clock: &ManualClock,
    ) -> Vec<RecognitionEvent> {
        let mut produced = Vec::new();
        let promotion_period = session.promotion_period();
        let feed_period = session.feed_period();
        let Some(until) = self
            .elapsed
            .checked_add(span)
            .filter(|until| until.checked_add(promotion_period.max(feed_period)).is_some())
        else {
            tracing::warn!(
                elapsed = ?self.elapsed,
                ?span,
                "timeline span overflows logical time; ignored"
            );
            return produced;
        };

        // Zero periods would never move time forward.
        if promotion_period.is_zero() || feed_period.is_zero() {
            self.step_clock(until, clock);
            return produced;
        }

        loop {
            let next = self.next_promotion.min(self.next_feed);
            if next > until {
                break;
            }
            self.step_clock(next, clock);

            if self.next_promotion == next {
                produced.extend(session.promote_tick(rng, clock));
                self.next_promotion += promotion_period;
            }
            if self.next_feed == next {
                produced.extend(session.feed_tick(rng, clock));
                self.next_feed += feed_period;
            }
        }
        self.step_clock(until, clock);
        produced
    }

    fn step_clock(&mut self, to: Duration, clock: &ManualClock) {
        let delta = to.saturating_sub(self.elapsed);
        if let Ok(delta) = chrono::Duration::from_std(delta) {
            clock.advance(delta);
        }
        self.elapsed = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::event_log::EventLog;
    use crate::random::Scripted;
    use crate::roster::Roster;
    use crate::scheduler::{FeedCadence, PromotionCadence};
    use crate::types::{EventSource, Identity};

    fn session(ids: &[&str]) -> Session {
        let roster: Roster = ids
            .iter()
            .map(|id| Identity {
                id: id.to_string(),
                name: id.to_string(),
                role: "staff".into(),
                photo_url: String::new(),
                notes: None,
                last_seen: "Never".into(),
            })
            .collect();
        Session::new(
            roster,
            EventLog::unbounded(),
            PromotionCadence::new(Duration::from_secs(8)),
            FeedCadence::new(Duration::from_secs(10)),
        )
    }

    #[test]
    fn test_cadences_interleave_by_time() {
        let mut s = session(&["p1", "p2", "p3", "p4"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        let start = clock.now();
        let mut timeline = Timeline::for_session(&s);

        let events = timeline.run_for(Duration::from_secs(41), &mut s, &mut rng, &clock);
        let sources: Vec<_> = events.iter().map(|e| e.source).collect();
        use EventSource::*;
        // promotions at 8,16,24,32; feed at 10,20,30,40
        assert_eq!(
            sources,
            vec![Promotion, Feed, Promotion, Feed, Promotion, Feed, Promotion, Feed]
        );
        assert_eq!((events[0].timestamp - start).num_seconds(), 8);
        assert_eq!((events[1].timestamp - start).num_seconds(), 10);
        assert_eq!((clock.now() - start).num_seconds(), 41);
        assert_eq!(s.snapshot().present_today, 4);
    }

    #[test]
    fn test_promotion_stops_once_everyone_present() {
        let mut s = session(&["p1", "p2"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        let mut timeline = Timeline::for_session(&s);

        let events = timeline.run_for(Duration::from_secs(80), &mut s, &mut rng, &clock);
        let promotions = events.iter().filter(|e| e.source == EventSource::Promotion).count();
        let feeds = events.iter().filter(|e| e.source == EventSource::Feed).count();
        assert_eq!(promotions, 2);
        assert_eq!(feeds, 8);
    }

    #[test]
    fn test_run_for_resumes_where_it_left_off() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        let mut timeline = Timeline::for_session(&s);

        assert!(timeline.run_for(Duration::from_secs(5), &mut s, &mut rng, &clock).is_empty());
        let events = timeline.run_for(Duration::from_secs(5), &mut s, &mut rng, &clock);
        assert_eq!(events.len(), 2);
        assert_eq!(timeline.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_overflowing_span_is_ignored() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        let mut timeline = Timeline::for_session(&s);

        assert!(timeline.run_for(Duration::from_secs(5), &mut s, &mut rng, &clock).is_empty());
        let before = clock.now();
        assert!(timeline.run_for(Duration::MAX, &mut s, &mut rng, &clock).is_empty());
        assert_eq!(timeline.elapsed(), Duration::from_secs(5));
        assert_eq!(clock.now(), before);

        let events = timeline.run_for(Duration::from_secs(5), &mut s, &mut rng, &clock);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_inactive_session_produces_nothing() {
        let mut s = session(&["p1"]);
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        let mut timeline = Timeline::for_session(&s);
        assert!(timeline.run_for(Duration::from_secs(60), &mut s, &mut rng, &clock).is_empty());
    }
}
