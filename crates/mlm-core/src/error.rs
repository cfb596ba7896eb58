//! Error types for `mlm-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// No participant is eligible for selection.
  #[error("no active participants to choose a leader from")]
  EmptyRoster,

  /// A selection already exists for this occurrence of the slot.
  #[error("occurrence {occurrence} of slot {slot_id} already has a leader")]
  AlreadyDecided {
    slot_id:    Uuid,
    occurrence: DateTime<Utc>,
  },

  #[error("participant not found: {0}")]
  ParticipantNotFound(String),

  #[error("{name} (id={id}) is already inactive")]
  ParticipantInactive { id: Uuid, name: String },

  #[error("participant {0:?} already exists")]
  DuplicateParticipant(String),

  #[error("a meeting already exists at {0}")]
  DuplicateSlot(String),

  #[error("invalid weekday {0:?}; expected one of monday..sunday")]
  InvalidWeekday(String),

  #[error("invalid time {0:?}; expected H:M in 24h format")]
  InvalidTime(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Lets generic callers recognise the core error kinds a storage backend may
/// surface through its own error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The wrapped core error, if this error originated as one.
  fn as_core(&self) -> Option<&Error>;

  /// `true` when the write lost a race against another writer for the same
  /// occurrence.
  fn is_already_decided(&self) -> bool {
    matches!(self.as_core(), Some(Error::AlreadyDecided { .. }))
  }
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}
