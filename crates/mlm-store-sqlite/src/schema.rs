//! SQL schema for the rotation store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted; removal flips `active` to 0.
CREATE TABLE IF NOT EXISTS participants (
    participant_id TEXT PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    contact        TEXT,
    active         INTEGER NOT NULL DEFAULT 1,
    fairness_score INTEGER NOT NULL DEFAULT 0 CHECK (fairness_score >= 0),
    created_at     TEXT NOT NULL
);

-- One row per weekly slot; unique on the anchor-week timestamp.
CREATE TABLE IF NOT EXISTS meeting_slots (
    slot_id   TEXT PRIMARY KEY,
    weekday   INTEGER NOT NULL CHECK (weekday BETWEEN 0 AND 6),
    time      TEXT NOT NULL,   -- HH:MM, UTC
    anchor_at TEXT NOT NULL UNIQUE
);

-- Strictly append-only; at most one leader per slot occurrence.
CREATE TABLE IF NOT EXISTS selections (
    selection_id   TEXT PRIMARY KEY,
    slot_id        TEXT NOT NULL REFERENCES meeting_slots(slot_id),
    occurrence     TEXT NOT NULL,   -- RFC 3339 UTC
    participant_id TEXT NOT NULL REFERENCES participants(participant_id),
    recorded_at    TEXT NOT NULL,
    UNIQUE (slot_id, occurrence)
);

CREATE INDEX IF NOT EXISTS selections_occurrence_idx ON selections(occurrence);
CREATE INDEX IF NOT EXISTS selections_participant_idx ON selections(participant_id);

PRAGMA user_version = 1;
";
