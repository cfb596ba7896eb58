//! The `RotationStore` trait.
//!
//! Implemented by storage backends (e.g. `mlm-store-sqlite`). The engine, the
//! dashboard, and the CLI depend on this abstraction, not on a concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::{
  error::StoreError,
  participant::{NewParticipant, Participant},
  schedule::MeetingSlot,
  selection::Selection,
};

/// Abstraction over the persistent roster, meeting slots, and rotation
/// history.
///
/// Selections are append-only. [`RotationStore::record_selection`] must apply
/// the new selection and the leader's score increment as one transactional
/// unit, and must fail with [`crate::Error::AlreadyDecided`] if a selection
/// for the same slot and occurrence already exists.
///
/// All methods return `Send` futures so the store can be shared across tokio
/// tasks.
pub trait RotationStore: Send + Sync {
  type Error: StoreError;

  // ── Participants ──────────────────────────────────────────────────────

  /// Enroll a new participant with a zero fairness score.
  fn add_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// Look a participant up by name. Returns `None` if not found.
  fn get_participant<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  /// All participants in enrollment order, optionally only the active ones.
  fn list_participants(
    &self,
    only_active: bool,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  fn list_active_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_ {
    self.list_participants(true)
  }

  /// Soft-delete a participant. Errors if they are unknown or already
  /// inactive.
  fn deactivate_participant<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + 'a;

  // ── Meeting slots ─────────────────────────────────────────────────────

  /// Add a weekly slot. Errors if a slot already exists at the same weekday
  /// and time.
  fn add_meeting_slot(
    &self,
    weekday: Weekday,
    time: NaiveTime,
  ) -> impl Future<Output = Result<MeetingSlot, Self::Error>> + Send + '_;

  /// All slots ordered by their position in the week.
  fn get_meeting_slots(
    &self,
  ) -> impl Future<Output = Result<Vec<MeetingSlot>, Self::Error>> + Send + '_;

  // ── Rotation history ──────────────────────────────────────────────────

  /// Every selection, oldest first (by occurrence, then by recording order).
  fn get_rotation_history(
    &self,
  ) -> impl Future<Output = Result<Vec<Selection>, Self::Error>> + Send + '_;

  /// The selection for one occurrence of a slot, if it has been decided.
  fn find_selection(
    &self,
    slot_id: Uuid,
    occurrence: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Selection>, Self::Error>> + Send + '_;

  /// Record the leader for an occurrence and increment their fairness score,
  /// atomically. Fails with `AlreadyDecided` if the occurrence has a leader
  /// and with `ParticipantInactive` if the participant was deactivated.
  fn record_selection(
    &self,
    slot_id: Uuid,
    occurrence: DateTime<Utc>,
    participant_id: Uuid,
  ) -> impl Future<Output = Result<Selection, Self::Error>> + Send + '_;

  /// The most recent selection, or `None` before the first one.
  fn get_current_leader(
    &self,
  ) -> impl Future<Output = Result<Option<Selection>, Self::Error>> + Send + '_;
}
