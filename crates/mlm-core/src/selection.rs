//! Selections — the append-only rotation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The leader chosen for one occurrence of a meeting slot. Written once by
/// the selection loop and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
  pub selection_id:   Uuid,
  pub slot_id:        Uuid,
  pub occurrence:     DateTime<Utc>,
  pub participant_id: Uuid,
  /// The leader's name at read time, joined from the roster.
  pub leader_name:    String,
  /// The leader's contact address at read time, joined from the roster.
  pub leader_contact: Option<String>,
  /// Server-assigned; also the tiebreak when two selections share an
  /// occurrence timestamp.
  pub recorded_at:    DateTime<Utc>,
}

impl Selection {
  /// Human-readable occurrence, e.g. `17.10.26 (Wednesday) - 10:00 UTC`.
  pub fn display_date(&self) -> String {
    self.occurrence.format("%d.%m.%y (%A) - %H:%M UTC").to_string()
  }
}
