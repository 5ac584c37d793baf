use crate::types::Identity;
use std::collections::HashSet;

/// Ids of identities recognized during the current session.
///
/// Grows monotonically until [`clear`](Self::clear). Arrival order is kept.
#[derive(Debug, Clone, Default)]
pub struct PresenceSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` present. Returns `false` if it is already present or is
    /// not part of `roster`.
    pub fn insert(&mut self, id: &str, roster: &[Identity]) -> bool {
        if self.index.contains(id) || !roster.iter().any(|p| p.id == id) {
            return false;
        }
        self.index.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Ids in arrival order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Roster members that are present, in roster order.
    pub fn present_in<'a>(
        &'a self,
        roster: &'a [Identity],
    ) -> impl Iterator<Item = &'a Identity> + 'a {
        roster.iter().filter(move |p| self.contains(&p.id))
    }

    /// Roster members not yet present, in roster order.
    pub fn absent_in<'a>(
        &'a self,
        roster: &'a [Identity],
    ) -> impl Iterator<Item = &'a Identity> + 'a {
        roster.iter().filter(move |p| !self.contains(&p.id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str) -> Identity {
        Identity {
            id: id.into(),
            name: id.to_uppercase(),
            role: "staff".into(),
            photo_url: format!("{id}.jpg"),
            notes: None,
            last_seen: "Never".into(),
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let roster = vec![person("p1")];
        let mut present = PresenceSet::new();
        assert!(present.insert("p1", &roster));
        assert!(!present.insert("p1", &roster));
        assert_eq!(present.len(), 1);
    }

    #[test]
    fn test_insert_rejects_unknown_id() {
        let roster = vec![person("p1")];
        let mut present = PresenceSet::new();
        assert!(!present.insert("p9", &roster));
        assert!(present.is_empty());
    }

    #[test]
    fn test_present_and_absent_partition_roster() {
        let roster = vec![person("p1"), person("p2"), person("p3")];
        let mut present = PresenceSet::new();
        present.insert("p3", &roster);
        present.insert("p1", &roster);

        let here: Vec<_> = present.present_in(&roster).map(|p| p.id.as_str()).collect();
        let away: Vec<_> = present.absent_in(&roster).map(|p| p.id.as_str()).collect();
        assert_eq!(here, vec!["p1", "p3"]);
        assert_eq!(away, vec!["p2"]);
        assert_eq!(present.ids(), &["p3".to_string(), "p1".to_string()]);
    }

    #[test]
    fn test_clear() {
        let roster = vec![person("p1")];
        let mut present = PresenceSet::new();
        present.insert("p1", &roster);
        present.clear();
        assert!(!present.contains("p1"));
        assert!(present.insert("p1", &roster));
    }
}
