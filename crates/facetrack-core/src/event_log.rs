use crate::types::{Identity, RecognitionEvent};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Default number of feed entries kept before the oldest is evicted.
pub const DEFAULT_FEED_CAPACITY: usize = 200;

/// Newest-first recognition feed.
///
/// With a capacity, appending to a full log evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<RecognitionEvent>,
    capacity: Option<NonZeroUsize>,
}

impl EventLog {
    /// Log bounded to `capacity` entries.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get().min(1024)),
            capacity: Some(capacity),
        }
    }

    /// Log without an eviction policy.
    pub fn unbounded() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: None,
        }
    }

    /// Bounded when `capacity > 0`, unbounded for `0`.
    pub fn with_capacity(capacity: usize) -> Self {
        NonZeroUsize::new(capacity).map_or_else(Self::unbounded, Self::bounded)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    /// Insert at the front. Returns the evicted entry, if any.
    pub fn append(&mut self, event: RecognitionEvent) -> Option<RecognitionEvent> {
        self.entries.push_front(event);
        match self.capacity {
            Some(cap) if self.entries.len() > cap.get() => self.entries.pop_back(),
            _ => None,
        }
    }

    /// Look up the event's identity in the current roster.
    ///
    /// `None` when the identity was removed after the event was recorded.
    pub fn resolve_identity<'r>(
        event: &RecognitionEvent,
        roster: &'r [Identity],
    ) -> Option<&'r Identity> {
        roster.iter().find(|p| p.id == event.identity_id)
    }

    /// Entries paired with their identity, newest first. Orphans are skipped.
    pub fn resolved<'a>(
        &'a self,
        roster: &'a [Identity],
    ) -> impl Iterator<Item = (&'a RecognitionEvent, &'a Identity)> + 'a {
        self.entries
            .iter()
            .filter_map(move |e| Self::resolve_identity(e, roster).map(|p| (e, p)))
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &RecognitionEvent> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RecognitionEvent> {
        self.entries.get(index)
    }

    /// Mean confidence over all retained entries, rounded to the nearest percent.
    pub fn average_confidence(&self) -> Option<u8> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: u32 = self.entries.iter().map(|e| u32::from(e.confidence)).sum();
        let avg = f64::from(sum) / self.entries.len() as f64;
        Some(avg.round() as u8)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }
}
