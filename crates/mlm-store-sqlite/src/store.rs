//! [`SqliteStore`] — the SQLite implementation of [`RotationStore`].

use std::path::Path;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use mlm_core::{
  participant::{NewParticipant, Participant},
  schedule::MeetingSlot,
  selection::Selection,
  store::RotationStore,
};

use crate::{
  encode::{
    PARTICIPANT_COLUMNS, RawParticipant, RawSelection, RawSlot, SELECTION_QUERY, SLOT_COLUMNS,
    encode_dt, encode_time, encode_uuid, encode_weekday,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Closure outcomes ────────────────────────────────────────────────────────

/// What a guarded write found once inside its transaction.
enum Guarded<T> {
  Done(T),
  NotFound,
  Conflict,
  /// The participant exists but has been deactivated; carries their name.
  Inactive(String),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rotation store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn participant_by(&self, column: &'static str, value: String) -> Result<Option<Participant>> {
    let raw: Option<RawParticipant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE {column} = ?1"),
              rusqlite::params![value],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }
}

// ─── RotationStore impl ──────────────────────────────────────────────────────

impl RotationStore for SqliteStore {
  type Error = Error;

  // ── Participants ──────────────────────────────────────────────────────────

  async fn add_participant(&self, input: NewParticipant) -> Result<Participant> {
    let participant = Participant {
      participant_id: Uuid::new_v4(),
      name:           input.name,
      contact:        input.contact,
      active:         true,
      fairness_score: 0,
      created_at:     Utc::now(),
    };

    let id_str  = encode_uuid(participant.participant_id);
    let name    = participant.name.clone();
    let contact = participant.contact.clone();
    let at_str  = encode_dt(participant.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM participants WHERE name = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Guarded::Conflict);
        }
        tx.execute(
          "INSERT INTO participants (participant_id, name, contact, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, contact, at_str],
        )?;
        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    match outcome {
      Guarded::Done(()) => {
        tracing::debug!(name = %participant.name, "participant enrolled");
        Ok(participant)
      }
      Guarded::Conflict | Guarded::NotFound | Guarded::Inactive(_) => {
        Err(mlm_core::Error::DuplicateParticipant(participant.name).into())
      }
    }
  }

  async fn get_participant(&self, name: &str) -> Result<Option<Participant>> {
    self.participant_by("name", name.to_owned()).await
  }

  async fn list_participants(&self, only_active: bool) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(move |conn| {
        let sql = if only_active {
          format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE active = 1 ORDER BY rowid"
          )
        } else {
          format!("SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY rowid")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn deactivate_participant(&self, name: &str) -> Result<Participant> {
    let name_owned = name.to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw = tx
          .query_row(
            &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE name = ?1"),
            rusqlite::params![name_owned],
            RawParticipant::from_row,
          )
          .optional()?;

        let Some(mut raw) = raw else {
          return Ok(Guarded::NotFound);
        };
        if !raw.active {
          return Ok(Guarded::Conflict);
        }
        tx.execute(
          "UPDATE participants SET active = 0 WHERE participant_id = ?1",
          rusqlite::params![raw.participant_id],
        )?;
        tx.commit()?;
        raw.active = false;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_participant(),
      Guarded::NotFound => Err(mlm_core::Error::ParticipantNotFound(name.to_owned()).into()),
      Guarded::Conflict | Guarded::Inactive(_) => {
        let existing = self
          .get_participant(name)
          .await?
          .ok_or_else(|| mlm_core::Error::ParticipantNotFound(name.to_owned()))?;
        Err(
          mlm_core::Error::ParticipantInactive {
            id:   existing.participant_id,
            name: existing.name,
          }
          .into(),
        )
      }
    }
  }

  // ── Meeting slots ─────────────────────────────────────────────────────────

  async fn add_meeting_slot(&self, weekday: Weekday, time: NaiveTime) -> Result<MeetingSlot> {
    let slot = MeetingSlot::new(weekday, time);

    let id_str      = encode_uuid(slot.slot_id);
    let weekday_num = encode_weekday(slot.weekday);
    let time_str    = encode_time(slot.time);
    let anchor_str  = encode_dt(slot.anchor_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM meeting_slots WHERE anchor_at = ?1",
            rusqlite::params![anchor_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Guarded::Conflict);
        }
        tx.execute(
          "INSERT INTO meeting_slots (slot_id, weekday, time, anchor_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, weekday_num, time_str, anchor_str],
        )?;
        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    match outcome {
      Guarded::Done(()) => Ok(slot),
      Guarded::Conflict | Guarded::NotFound | Guarded::Inactive(_) => {
        Err(mlm_core::Error::DuplicateSlot(slot.describe()).into())
      }
    }
  }

  async fn get_meeting_slots(&self) -> Result<Vec<MeetingSlot>> {
    let raws: Vec<RawSlot> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SLOT_COLUMNS} FROM meeting_slots ORDER BY anchor_at"
        ))?;
        let rows = stmt
          .query_map([], RawSlot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSlot::into_slot).collect()
  }

  // ── Rotation history ──────────────────────────────────────────────────────

  async fn get_rotation_history(&self) -> Result<Vec<Selection>> {
    let raws: Vec<RawSelection> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{SELECTION_QUERY} ORDER BY s.occurrence, s.rowid"))?;
        let rows = stmt
          .query_map([], RawSelection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSelection::into_selection).collect()
  }

  async fn find_selection(
    &self,
    slot_id:    Uuid,
    occurrence: DateTime<Utc>,
  ) -> Result<Option<Selection>> {
    let slot_str = encode_uuid(slot_id);
    let at_str   = encode_dt(occurrence);

    let raw: Option<RawSelection> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECTION_QUERY} WHERE s.slot_id = ?1 AND s.occurrence = ?2"),
              rusqlite::params![slot_str, at_str],
              RawSelection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSelection::into_selection).transpose()
  }

  async fn record_selection(
    &self,
    slot_id:        Uuid,
    occurrence:     DateTime<Utc>,
    participant_id: Uuid,
  ) -> Result<Selection> {
    let selection_id = Uuid::new_v4();
    let recorded_at  = Utc::now();

    let sel_str         = encode_uuid(selection_id);
    let slot_str        = encode_uuid(slot_id);
    let occurrence_str  = encode_dt(occurrence);
    let participant_str = encode_uuid(participant_id);
    let recorded_str    = encode_dt(recorded_at);

    // Conflict check, insert, and score increment commit together or not at
    // all.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let decided = tx
          .query_row(
            "SELECT 1 FROM selections WHERE slot_id = ?1 AND occurrence = ?2",
            rusqlite::params![slot_str, occurrence_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if decided {
          return Ok(Guarded::Conflict);
        }

        let bumped = tx.execute(
          "UPDATE participants SET fairness_score = fairness_score + 1
           WHERE participant_id = ?1 AND active = 1",
          rusqlite::params![participant_str],
        )?;
        if bumped == 0 {
          // Deactivated since the caller read the roster, or never existed.
          let name: Option<String> = tx
            .query_row(
              "SELECT name FROM participants WHERE participant_id = ?1",
              rusqlite::params![participant_str],
              |row| row.get(0),
            )
            .optional()?;
          return Ok(name.map_or(Guarded::NotFound, Guarded::Inactive));
        }

        tx.execute(
          "INSERT INTO selections (selection_id, slot_id, occurrence, participant_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![sel_str, slot_str, occurrence_str, participant_str, recorded_str],
        )?;

        let leader: (String, Option<String>) = tx.query_row(
          "SELECT name, contact FROM participants WHERE participant_id = ?1",
          rusqlite::params![participant_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        tx.commit()?;
        Ok(Guarded::Done(leader))
      })
      .await?;

    match outcome {
      Guarded::Done((leader_name, leader_contact)) => Ok(Selection {
        selection_id,
        slot_id,
        occurrence,
        participant_id,
        leader_name,
        leader_contact,
        recorded_at,
      }),
      Guarded::Conflict => {
        Err(mlm_core::Error::AlreadyDecided { slot_id, occurrence }.into())
      }
      Guarded::NotFound => {
        Err(mlm_core::Error::ParticipantNotFound(participant_id.to_string()).into())
      }
      Guarded::Inactive(name) => {
        Err(mlm_core::Error::ParticipantInactive { id: participant_id, name }.into())
      }
    }
  }

  async fn get_current_leader(&self) -> Result<Option<Selection>> {
    let raw: Option<RawSelection> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECTION_QUERY} ORDER BY s.occurrence DESC, s.rowid DESC LIMIT 1"),
              [],
              RawSelection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSelection::into_selection).transpose()
  }
}
