//! Participants — the roster the leader is drawn from.
//!
//! Participants are never physically deleted. Removing someone from the team
//! flips `active` to `false` so that past selections keep pointing at a real
//! row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of the rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id: Uuid,
  /// Unique display name.
  pub name:           String,
  /// Where the notification goes; participants without one are still
  /// eligible, they just never hear about it.
  pub contact:        Option<String>,
  pub active:         bool,
  /// Number of selections that reference this participant.
  pub fairness_score: u32,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::RotationStore::add_participant`].
#[derive(Debug, Clone)]
pub struct NewParticipant {
  pub name:    String,
  pub contact: Option<String>,
}

impl NewParticipant {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), contact: None }
  }

  pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
    self.contact = Some(contact.into());
    self
  }
}
