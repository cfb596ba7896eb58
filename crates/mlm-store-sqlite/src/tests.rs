//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc, Weekday};
use mlm_core::{
  error::StoreError as _,
  participant::NewParticipant,
  store::RotationStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ten_am() -> NaiveTime { NaiveTime::from_hms_opt(10, 0, 0).unwrap() }

fn wednesday() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap() }

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_participant() {
  let s = store().await;

  let added = s
    .add_participant(NewParticipant::new("alice").with_contact("alice@example.com"))
    .await
    .unwrap();
  assert!(added.active);
  assert_eq!(added.fairness_score, 0);

  let fetched = s.get_participant("alice").await.unwrap().unwrap();
  assert_eq!(fetched.participant_id, added.participant_id);
  assert_eq!(fetched.contact.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn get_participant_missing_returns_none() {
  let s = store().await;
  assert!(s.get_participant("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
  let s = store().await;
  s.add_participant(NewParticipant::new("bob")).await.unwrap();

  let err = s.add_participant(NewParticipant::new("bob")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(mlm_core::Error::DuplicateParticipant(ref n)) if n == "bob"
  ));
}

#[tokio::test]
async fn deactivate_is_a_soft_delete() {
  let s = store().await;
  s.add_participant(NewParticipant::new("a")).await.unwrap();
  s.add_participant(NewParticipant::new("b")).await.unwrap();

  let gone = s.deactivate_participant("a").await.unwrap();
  assert!(!gone.active);

  let active = s.list_active_participants().await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].name, "b");

  // Still there, just inactive.
  let all = s.list_participants(false).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn deactivate_twice_fails() {
  let s = store().await;
  s.add_participant(NewParticipant::new("a")).await.unwrap();
  s.deactivate_participant("a").await.unwrap();

  let err = s.deactivate_participant("a").await.unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(mlm_core::Error::ParticipantInactive { name, .. }) if name == "a"
  ));
}

#[tokio::test]
async fn deactivate_unknown_fails() {
  let s = store().await;
  let err = s.deactivate_participant("ghost").await.unwrap_err();
  assert!(matches!(err.as_core(), Some(mlm_core::Error::ParticipantNotFound(_))));
}

// ─── Meeting slots ───────────────────────────────────────────────────────────

#[tokio::test]
async fn slots_are_ordered_by_week_position() {
  let s = store().await;
  s.add_meeting_slot(Weekday::Fri, ten_am()).await.unwrap();
  s.add_meeting_slot(Weekday::Mon, ten_am()).await.unwrap();
  s.add_meeting_slot(Weekday::Mon, NaiveTime::from_hms_opt(8, 30, 0).unwrap())
    .await
    .unwrap();

  let slots = s.get_meeting_slots().await.unwrap();
  let order: Vec<_> = slots.iter().map(|m| (m.weekday, m.time)).collect();
  assert_eq!(
    order,
    vec![
      (Weekday::Mon, NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
      (Weekday::Mon, ten_am()),
      (Weekday::Fri, ten_am()),
    ]
  );
}

#[tokio::test]
async fn duplicate_slot_is_rejected() {
  let s = store().await;
  s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  let err = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap_err();
  assert!(matches!(err.as_core(), Some(mlm_core::Error::DuplicateSlot(_))));
}

// ─── Selections ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_selection_bumps_score() {
  let s = store().await;
  let alice = s.add_participant(NewParticipant::new("alice")).await.unwrap();
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  let selection = s
    .record_selection(slot.slot_id, wednesday(), alice.participant_id)
    .await
    .unwrap();
  assert_eq!(selection.leader_name, "alice");
  assert_eq!(selection.occurrence, wednesday());

  let alice = s.get_participant("alice").await.unwrap().unwrap();
  assert_eq!(alice.fairness_score, 1);

  let found = s.find_selection(slot.slot_id, wednesday()).await.unwrap().unwrap();
  assert_eq!(found.selection_id, selection.selection_id);
}

#[tokio::test]
async fn second_record_for_same_occurrence_conflicts_without_side_effects() {
  let s = store().await;
  let a = s.add_participant(NewParticipant::new("a")).await.unwrap();
  let b = s.add_participant(NewParticipant::new("b")).await.unwrap();
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  s.record_selection(slot.slot_id, wednesday(), a.participant_id)
    .await
    .unwrap();
  let err = s
    .record_selection(slot.slot_id, wednesday(), b.participant_id)
    .await
    .unwrap_err();
  assert!(err.is_already_decided());

  // The losing write left nothing behind.
  let b = s.get_participant("b").await.unwrap().unwrap();
  assert_eq!(b.fairness_score, 0);
  assert_eq!(s.get_rotation_history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn record_for_unknown_participant_fails() {
  let s = store().await;
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  let err = s
    .record_selection(slot.slot_id, wednesday(), uuid::Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(mlm_core::Error::ParticipantNotFound(_))));
  assert!(s.get_rotation_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn record_for_deactivated_participant_fails() {
  let s = store().await;
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();
  let a = s.add_participant(NewParticipant::new("a")).await.unwrap();

  // Removed after the roster was read, before the leader is recorded.
  s.deactivate_participant("a").await.unwrap();

  let err = s
    .record_selection(slot.slot_id, wednesday(), a.participant_id)
    .await
    .unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(mlm_core::Error::ParticipantInactive { id, name })
      if *id == a.participant_id && name == "a"
  ));
  assert!(s.get_rotation_history().await.unwrap().is_empty());
  let a = s.get_participant("a").await.unwrap().unwrap();
  assert_eq!(a.fairness_score, 0);
}

#[tokio::test]
async fn history_is_chronological_and_current_leader_is_latest() {
  let s = store().await;
  let a = s.add_participant(NewParticipant::new("a")).await.unwrap();
  let b = s.add_participant(NewParticipant::new("b")).await.unwrap();
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  assert!(s.get_current_leader().await.unwrap().is_none());

  // Recorded out of order on purpose.
  let later = wednesday() + Duration::weeks(1);
  s.record_selection(slot.slot_id, later, b.participant_id)
    .await
    .unwrap();
  s.record_selection(slot.slot_id, wednesday(), a.participant_id)
    .await
    .unwrap();

  let history = s.get_rotation_history().await.unwrap();
  let names: Vec<_> = history.iter().map(|h| h.leader_name.as_str()).collect();
  assert_eq!(names, ["a", "b"]);

  let current = s.get_current_leader().await.unwrap().unwrap();
  assert_eq!(current.leader_name, "b");
  assert_eq!(current.occurrence, later);
}

#[tokio::test]
async fn fairness_score_matches_selection_count() {
  let s = store().await;
  let a = s.add_participant(NewParticipant::new("a")).await.unwrap();
  let b = s.add_participant(NewParticipant::new("b")).await.unwrap();
  let slot = s.add_meeting_slot(Weekday::Wed, ten_am()).await.unwrap();

  let leaders = [&a, &b, &a, &a, &b];
  for (week, leader) in leaders.iter().enumerate() {
    s.record_selection(
      slot.slot_id,
      wednesday() + Duration::weeks(week as i64),
      leader.participant_id,
    )
    .await
    .unwrap();
  }
  // A conflicting write must not disturb the count.
  let _ = s
    .record_selection(slot.slot_id, wednesday(), b.participant_id)
    .await;

  let history = s.get_rotation_history().await.unwrap();
  for p in s.list_participants(false).await.unwrap() {
    let count = history
      .iter()
      .filter(|h| h.participant_id == p.participant_id)
      .count();
    assert_eq!(p.fairness_score as usize, count, "{}", p.name);
  }
}

#[tokio::test]
async fn store_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("db.sqlite");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.add_participant(NewParticipant::new("persisted")).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.get_participant("persisted").await.unwrap().is_some());
}
