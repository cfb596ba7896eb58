//! Weekly meeting slots and occurrence resolution.
//!
//! A slot is a weekday plus a UTC time of day. Its canonical form is the
//! occurrence in the anchor week (the week starting Monday 1970-01-05); the
//! store enforces uniqueness on that canonical timestamp. Concrete
//! occurrences are resolved against "now" and are always in the future or
//! exactly now, never in the past.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Slot ────────────────────────────────────────────────────────────────────

/// A recurring weekly meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSlot {
  pub slot_id:   Uuid,
  pub weekday:   Weekday,
  /// UTC time of day, always with zero seconds.
  pub time:      NaiveTime,
  /// The slot's occurrence in the anchor week.
  pub anchor_at: DateTime<Utc>,
}

impl MeetingSlot {
  /// Build a slot with a fresh id. The time is truncated to the minute.
  pub fn new(weekday: Weekday, time: NaiveTime) -> Self {
    let time = truncate_to_minute(time);
    Self {
      slot_id: Uuid::new_v4(),
      weekday,
      time,
      anchor_at: canonical_occurrence(weekday, time),
    }
  }

  /// The next occurrence of this slot at or after `now`.
  pub fn next_occurrence(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    next_occurrence(now, self.weekday, self.time)
  }

  /// e.g. `Meeting: Wednesday at 10:00 UTC`
  pub fn describe(&self) -> String {
    format!("Meeting: {} at {} UTC", weekday_name(self.weekday), self.time.format("%H:%M"))
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Monday of the anchor week. Any Monday works; only the weekday offset from
/// it matters.
pub fn anchor_monday() -> DateTime<Utc> {
  // 1970-01-01 was a Thursday.
  DateTime::UNIX_EPOCH + Duration::days(4)
}

/// The slot's occurrence in the anchor week.
pub fn canonical_occurrence(weekday: Weekday, time: NaiveTime) -> DateTime<Utc> {
  let day = anchor_monday().date_naive()
    + Duration::days(i64::from(weekday.num_days_from_monday()));
  day.and_time(truncate_to_minute(time)).and_utc()
}

/// The first occurrence of `weekday` at `time` (UTC) that is not earlier than
/// `now`.
///
/// A slot falling on today's weekday whose time has already passed resolves
/// to the same weekday next week; if the time equals `now` to the minute
/// boundary it resolves to `now` itself.
pub fn next_occurrence(
  now: DateTime<Utc>,
  weekday: Weekday,
  time: NaiveTime,
) -> DateTime<Utc> {
  let today  = i64::from(now.weekday().num_days_from_monday());
  let target = i64::from(weekday.num_days_from_monday());
  let ahead  = (7 - today + target).rem_euclid(7);

  let candidate = (now.date_naive() + Duration::days(ahead))
    .and_time(truncate_to_minute(time))
    .and_utc();

  if candidate < now {
    candidate + Duration::weeks(1)
  } else {
    candidate
  }
}

/// The earliest upcoming occurrence across `slots`, with the slot it belongs
/// to. Ties go to the slot listed first. `None` if no slot is configured.
pub fn next_meeting(
  now: DateTime<Utc>,
  slots: &[MeetingSlot],
) -> Option<(&MeetingSlot, DateTime<Utc>)> {
  slots
    .iter()
    .map(|slot| (slot, slot.next_occurrence(now)))
    .min_by_key(|(_, at)| *at)
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
  time
    .with_second(0)
    .and_then(|t| t.with_nanosecond(0))
    .unwrap_or(time)
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a full or abbreviated weekday name, case-insensitively.
pub fn parse_weekday(input: &str) -> Result<Weekday> {
  input
    .trim()
    .parse::<Weekday>()
    .map_err(|_| Error::InvalidWeekday(input.to_owned()))
}

/// Weekday from its index, Monday = 0.
pub fn weekday_from_index(index: u8) -> Result<Weekday> {
  Weekday::try_from(index).map_err(|_| Error::InvalidWeekday(index.to_string()))
}

/// Parse `H:M` / `HH:MM` in 24h format.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
  let invalid = || Error::InvalidTime(input.to_owned());

  let (hour, minute) = input.trim().split_once(':').ok_or_else(invalid)?;
  let well_formed =
    |part: &str| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
  if !well_formed(hour) || !well_formed(minute) {
    return Err(invalid());
  }
  let hour: u32   = hour.parse().map_err(|_| invalid())?;
  let minute: u32 = minute.parse().map_err(|_| invalid())?;

  NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
  match weekday {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}
