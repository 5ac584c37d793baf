//! Enrolled identities.

use crate::types::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display label for someone who has never been seen.
pub const NEVER_SEEN: &str = "Never";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("duplicate identity id: {0}")]
    DuplicateId(String),
}

/// Enrollment form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIdentity {
    pub name: String,
    pub role: String,
    pub photo_url: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewIdentity {
    fn validate(&self) -> Result<(), RosterError> {
        for (field, value) in [
            ("name", &self.name),
            ("role", &self.role),
            ("photo_url", &self.photo_url),
        ] {
            if value.trim().is_empty() {
                return Err(RosterError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Ordered list of enrolled identities.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    people: Vec<Identity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll a new person, assigning a fresh id and a "Never" last-seen label.
    pub fn enroll(&mut self, form: NewIdentity) -> Result<Identity, RosterError> {
        form.validate()?;
        let identity = Identity {
            id: format!("p-{}", uuid::Uuid::new_v4().simple()),
            name: form.name.trim().to_string(),
            role: form.role.trim().to_string(),
            photo_url: form.photo_url,
            notes: form.notes.filter(|n| !n.trim().is_empty()),
            last_seen: NEVER_SEEN.to_string(),
        };
        self.people.push(identity.clone());
        tracing::debug!(id = %identity.id, name = %identity.name, "identity enrolled");
        Ok(identity)
    }

    /// Insert a pre-built identity (fixtures). Ids must stay unique.
    pub fn insert(&mut self, identity: Identity) -> Result<(), RosterError> {
        if self.contains(&identity.id) {
            return Err(RosterError::DuplicateId(identity.id));
        }
        self.people.push(identity);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Identity, RosterError> {
        let pos = self
            .people
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| RosterError::UnknownIdentity(id.to_string()))?;
        Ok(self.people.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Identity> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Case-insensitive substring match on name or role. An empty query matches everyone.
    pub fn search(&self, query: &str) -> Vec<&Identity> {
        let needle = query.trim().to_lowercase();
        self.people
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.role.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn as_slice(&self) -> &[Identity] {
        &self.people
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identity> {
        self.people.iter()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

impl FromIterator<Identity> for Roster {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for identity in iter {
            if let Err(e) = roster.insert(identity) {
                tracing::warn!(error = %e, "skipping identity");
            }
        }
        roster
    }
}
