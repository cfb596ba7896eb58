//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings,
//! weekdays their Monday-based index, and times of day `HH:MM`.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use mlm_core::{
  participant::Participant,
  schedule::{MeetingSlot, weekday_from_index},
  selection::Selection,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Weekday / time of day ────────────────────────────────────────────────────

pub fn encode_weekday(w: Weekday) -> i64 { i64::from(w.num_days_from_monday()) }

pub fn decode_weekday(n: i64) -> Result<Weekday> {
  u8::try_from(n)
    .ok()
    .and_then(|n| weekday_from_index(n).ok())
    .ok_or_else(|| Error::Corrupt(format!("weekday index {n}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A `participants` row as read from SQLite.
pub struct RawParticipant {
  pub participant_id: String,
  pub name:           String,
  pub contact:        Option<String>,
  pub active:         bool,
  pub fairness_score: i64,
  pub created_at:     String,
}

/// Column list matching [`RawParticipant::from_row`].
pub const PARTICIPANT_COLUMNS: &str =
  "participant_id, name, contact, active, fairness_score, created_at";

impl RawParticipant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id: row.get(0)?,
      name:           row.get(1)?,
      contact:        row.get(2)?,
      active:         row.get(3)?,
      fairness_score: row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id: decode_uuid(&self.participant_id)?,
      name:           self.name,
      contact:        self.contact,
      active:         self.active,
      fairness_score: u32::try_from(self.fairness_score)
        .map_err(|_| Error::Corrupt(format!("fairness score {}", self.fairness_score)))?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// A `meeting_slots` row as read from SQLite.
pub struct RawSlot {
  pub slot_id:   String,
  pub weekday:   i64,
  pub time:      String,
  pub anchor_at: String,
}

pub const SLOT_COLUMNS: &str = "slot_id, weekday, time, anchor_at";

impl RawSlot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      slot_id:   row.get(0)?,
      weekday:   row.get(1)?,
      time:      row.get(2)?,
      anchor_at: row.get(3)?,
    })
  }

  pub fn into_slot(self) -> Result<MeetingSlot> {
    Ok(MeetingSlot {
      slot_id:   decode_uuid(&self.slot_id)?,
      weekday:   decode_weekday(self.weekday)?,
      time:      decode_time(&self.time)?,
      anchor_at: decode_dt(&self.anchor_at)?,
    })
  }
}

/// A `selections` row joined with its leader.
pub struct RawSelection {
  pub selection_id:   String,
  pub slot_id:        String,
  pub occurrence:     String,
  pub participant_id: String,
  pub recorded_at:    String,
  pub leader_name:    String,
  pub leader_contact: Option<String>,
}

/// `SELECT` prefix matching [`RawSelection::from_row`]; callers append
/// `WHERE` / `ORDER BY` clauses.
pub const SELECTION_QUERY: &str = "
  SELECT s.selection_id, s.slot_id, s.occurrence, s.participant_id,
         s.recorded_at, p.name, p.contact
  FROM selections s
  JOIN participants p ON p.participant_id = s.participant_id";

impl RawSelection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      selection_id:   row.get(0)?,
      slot_id:        row.get(1)?,
      occurrence:     row.get(2)?,
      participant_id: row.get(3)?,
      recorded_at:    row.get(4)?,
      leader_name:    row.get(5)?,
      leader_contact: row.get(6)?,
    })
  }

  pub fn into_selection(self) -> Result<Selection> {
    Ok(Selection {
      selection_id:   decode_uuid(&self.selection_id)?,
      slot_id:        decode_uuid(&self.slot_id)?,
      occurrence:     decode_dt(&self.occurrence)?,
      participant_id: decode_uuid(&self.participant_id)?,
      leader_name:    self.leader_name,
      leader_contact: self.leader_contact,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}
