//! Dashboard handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use mlm_core::{
  participant::Participant,
  schedule::{self, MeetingSlot},
  selection::Selection,
  store::RotationStore,
};
use serde::Serialize;

use crate::error::ApiError;

/// `GET /leader`
pub async fn leader<S: RotationStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Selection>, ApiError> {
  let current = store
    .get_current_leader()
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("no leader has been chosen yet".into()))?;
  Ok(Json(current))
}

/// `GET /history` — newest first.
pub async fn history<S: RotationStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Selection>>, ApiError> {
  let mut history = store.get_rotation_history().await.map_err(ApiError::store)?;
  history.reverse();
  Ok(Json(history))
}

/// `GET /members` — active participants, highest fairness score first.
pub async fn members<S: RotationStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
  let mut active = store
    .list_active_participants()
    .await
    .map_err(ApiError::store)?;
  active.sort_by(|a, b| b.fairness_score.cmp(&a.fairness_score));
  Ok(Json(active))
}

#[derive(Debug, Serialize)]
pub struct NextMeeting {
  pub slot:       MeetingSlot,
  pub occurrence: DateTime<Utc>,
}

/// `GET /next`
pub async fn next<S: RotationStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<NextMeeting>, ApiError> {
  let slots = store.get_meeting_slots().await.map_err(ApiError::store)?;
  let (slot, occurrence) = schedule::next_meeting(Utc::now(), &slots)
    .ok_or_else(|| ApiError::NotFound("no meetings scheduled".into()))?;
  Ok(Json(NextMeeting { slot: slot.clone(), occurrence }))
}
