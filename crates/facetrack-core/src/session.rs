//! Recognition session: the activity state machine and the state it owns.
//!
//! A [`Session`] holds the roster, the presence set and the recognition
//! feed. It starts `Inactive`; [`Session::start`] moves it to `Active`
//! only when a camera is configured. While `Active`, the host calls
//! [`Session::promote_tick`] and [`Session::feed_tick`] on their own
//! periods. Ticks on an inactive session do nothing.

use crate::clock::Clock;
use crate::event_log::EventLog;
use crate::presence::PresenceSet;
use crate::random::RandomSource;
use crate::roster::{NewIdentity, Roster, RosterError};
use crate::scheduler::{FeedCadence, PromotionCadence};
use crate::types::{Identity, RecognitionEvent};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no camera configured; add or activate a camera before starting recognition")]
    NoCameraConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Inactive,
    Active,
}

/// Dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub total_people: usize,
    /// Present identities that are still on the roster.
    pub present_today: usize,
    pub events: usize,
    pub average_confidence: Option<u8>,
}

pub struct Session {
    state: SessionState,
    roster: Roster,
    present: PresenceSet,
    feed: EventLog,
    promotion: PromotionCadence,
    sampler: FeedCadence,
}

impl Session {
    pub fn new(
        roster: Roster,
        feed: EventLog,
        promotion: PromotionCadence,
        sampler: FeedCadence,
    ) -> Self {
        Self {
            state: SessionState::Inactive,
            roster,
            present: PresenceSet::new(),
            feed,
            promotion,
            sampler,
        }
    }

    pub fn promotion_period(&self) -> Duration {
        self.promotion.period
    }

    pub fn feed_period(&self) -> Duration {
        self.sampler.period
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Activate recognition. Refused while no camera is configured.
    ///
    /// Starting an already active session is a no-op and succeeds, even if
    /// the camera has since gone away; the host decides when to stop.
    pub fn start(&mut self, camera_configured: bool) -> Result<(), SessionError> {
        if self.is_active() {
            return Ok(());
        }
        if !camera_configured {
            tracing::warn!("recognition start refused: no camera configured");
            return Err(SessionError::NoCameraConfigured);
        }
        self.state = SessionState::Active;
        tracing::info!(people = self.roster.len(), "recognition session active");
        Ok(())
    }

    /// Deactivate recognition. Idempotent; returns whether the session was active.
    pub fn stop(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = SessionState::Inactive;
        if was_active {
            tracing::info!(present = self.present.len(), "recognition session stopped");
        }
        was_active
    }

    /// Stop and discard presence and feed history.
    pub fn reset(&mut self) {
        self.stop();
        self.present.clear();
        self.feed.clear();
        tracing::debug!("session state reset");
    }

    /// One roster-promotion step: mark a random absent identity present.
    pub fn promote_tick(
        &mut self,
        rng: &mut dyn RandomSource,
        clock: &dyn Clock,
    ) -> Option<RecognitionEvent> {
        if !self.is_active() {
            return None;
        }
        let event = self
            .promotion
            .advance(self.roster.as_slice(), &self.present, rng, clock)?;
        self.present.insert(&event.identity_id, self.roster.as_slice());
        self.feed.append(event.clone());
        tracing::debug!(
            id = %event.identity_id,
            confidence = event.confidence,
            present = self.present.len(),
            "identity promoted to present"
        );
        Some(event)
    }

    /// One feed step: record a sighting of any roster member.
    pub fn feed_tick(
        &mut self,
        rng: &mut dyn RandomSource,
        clock: &dyn Clock,
    ) -> Option<RecognitionEvent> {
        if !self.is_active() {
            return None;
        }
        let event = self.sampler.advance(self.roster.as_slice(), rng, clock)?;
        self.feed.append(event.clone());
        tracing::debug!(id = %event.identity_id, confidence = event.confidence, "feed event");
        Some(event)
    }

    pub fn enroll(&mut self, form: NewIdentity) -> Result<Identity, RosterError> {
        self.roster.enroll(form)
    }

    /// Remove an identity. Its past events stay in the feed as orphans.
    pub fn remove_identity(&mut self, id: &str) -> Result<Identity, RosterError> {
        self.roster.remove(id)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn identity(&self, id: &str) -> Option<&Identity> {
        self.roster.get(id)
    }

    pub fn is_present(&self, id: &str) -> bool {
        self.present.contains(id)
    }

    /// Present identities in roster order.
    pub fn present_identities(&self) -> Vec<&Identity> {
        self.present.present_in(self.roster.as_slice()).collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Identity> {
        self.roster.search(query)
    }

    pub fn feed(&self) -> &EventLog {
        &self.feed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            total_people: self.roster.len(),
            present_today: self.present.present_in(self.roster.as_slice()).count(),
            events: self.feed.len(),
            average_confidence: self.feed.average_confidence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::random::{RngSource, Scripted};
    use crate::scheduler::{DEFAULT_FEED_PERIOD, DEFAULT_PROMOTION_PERIOD};
    use crate::types::EventSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(ids: &[&str]) -> Session {
        let roster: Roster = ids
            .iter()
            .map(|id| Identity {
                id: id.to_string(),
                name: format!("Person {id}"),
                role: "staff".into(),
                photo_url: format!("{id}.jpg"),
                notes: None,
                last_seen: "Never".into(),
            })
            .collect();
        Session::new(
            roster,
            EventLog::default(),
            PromotionCadence::new(DEFAULT_PROMOTION_PERIOD),
            FeedCadence::new(DEFAULT_FEED_PERIOD),
        )
    }

    #[test]
    fn test_start_without_camera_refused() {
        let mut s = session(&["p1"]);
        assert_eq!(s.start(false), Err(SessionError::NoCameraConfigured));
        assert_eq!(s.state(), SessionState::Inactive);
    }

    #[test]
    fn test_start_with_camera() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        assert!(s.is_active());
        // second start is a no-op
        s.start(true).unwrap();
        assert!(s.is_active());
    }

    #[test]
    fn test_start_while_active_succeeds_without_camera() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        assert_eq!(s.start(false), Ok(()));
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn test_stop_idempotent() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        assert!(s.stop());
        assert_eq!(s.state(), SessionState::Inactive);
        assert!(!s.stop());
        assert_eq!(s.state(), SessionState::Inactive);
    }

    #[test]
    fn test_ticks_noop_while_inactive() {
        let mut s = session(&["p1", "p2"]);
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        assert!(s.promote_tick(&mut rng, &clock).is_none());
        assert!(s.feed_tick(&mut rng, &clock).is_none());
        assert!(s.feed().is_empty());
        assert_eq!(s.snapshot().present_today, 0);
    }

    #[test]
    fn test_promotion_scenario_first_candidate() {
        let mut s = session(&["p1", "p2", "p3"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();

        for expected in ["p1", "p2", "p3"] {
            let e = s.promote_tick(&mut rng, &clock).unwrap();
            assert_eq!(e.identity_id, expected);
        }
        assert!(s.promote_tick(&mut rng, &clock).is_none());
        assert_eq!(s.feed().len(), 3);
        let present: Vec<_> = s.present_identities().iter().map(|p| p.id.clone()).collect();
        assert_eq!(present, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_promotion_terminates_without_spurious_events() {
        let mut s = session(&["a", "b"]);
        s.start(true).unwrap();
        let mut rng = RngSource(StdRng::seed_from_u64(3));
        let clock = ManualClock::default();
        for _ in 0..10 {
            s.promote_tick(&mut rng, &clock);
        }
        assert_eq!(s.snapshot().present_today, 2);
        assert_eq!(s.feed().len(), 2);
    }

    #[test]
    fn test_feed_tick_leaves_presence_alone() {
        let mut s = session(&["p1", "p2"]);
        s.start(true).unwrap();
        let mut rng = RngSource(StdRng::seed_from_u64(11));
        let clock = ManualClock::default();
        for _ in 0..5 {
            let e = s.feed_tick(&mut rng, &clock).unwrap();
            assert_eq!(e.source, EventSource::Feed);
        }
        assert_eq!(s.snapshot().present_today, 0);
        assert_eq!(s.feed().len(), 5);
    }

    #[test]
    fn test_removed_identity_becomes_orphan() {
        let mut s = session(&["p1", "p2"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        s.promote_tick(&mut rng, &clock);
        s.remove_identity("p1").unwrap();

        assert_eq!(s.feed().len(), 1);
        assert_eq!(s.feed().resolved(s.roster().as_slice()).count(), 0);
        assert_eq!(s.snapshot().present_today, 0);
        assert!(s.is_present("p1"));
    }

    #[test]
    fn test_reset_clears_presence_and_feed() {
        let mut s = session(&["p1"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        s.promote_tick(&mut rng, &clock);
        s.reset();
        assert_eq!(s.state(), SessionState::Inactive);
        assert!(s.feed().is_empty());
        assert!(!s.is_present("p1"));
    }

    #[test]
    fn test_enrolled_identity_becomes_candidate() {
        let mut s = session(&[]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        assert!(s.promote_tick(&mut rng, &clock).is_none());
        let p = s
            .enroll(NewIdentity {
                name: "Emily Rodriguez".into(),
                role: "Marketing".into(),
                photo_url: "e.jpg".into(),
                notes: None,
            })
            .unwrap();
        let e = s.promote_tick(&mut rng, &clock).unwrap();
        assert_eq!(e.identity_id, p.id);
    }

    #[test]
    fn test_snapshot_counts() {
        let mut s = session(&["p1", "p2", "p3"]);
        s.start(true).unwrap();
        let mut rng = Scripted::constant(0.0);
        let clock = ManualClock::default();
        s.promote_tick(&mut rng, &clock);
        s.feed_tick(&mut rng, &clock);
        let snap = s.snapshot();
        assert_eq!(snap.state, SessionState::Active);
        assert_eq!(snap.total_people, 3);
        assert_eq!(snap.present_today, 1);
        assert_eq!(snap.events, 2);
        assert_eq!(snap.average_confidence, Some(70));
    }
}
