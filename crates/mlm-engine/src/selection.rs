//! The selection loop: resolve, check, select or wait, repeat.
//!
//! Each pass resolves the next occurrence across all meeting slots and asks
//! the store whether it already has a leader. If not, a leader is drawn,
//! recorded together with their score increment, and pushed onto the
//! notification queue; the loop then re-resolves straight away. If the
//! occurrence is decided, the loop sleeps in `poll_interval` steps until the
//! occurrence plus the grace window has passed.
//!
//! Nothing here is fatal. A pass that cannot decide (no slots, nobody
//! active, a storage error) backs off for `retry_interval` and tries again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mlm_core::{
  error::StoreError as _,
  schedule,
  selection::Selection,
  selector,
  store::RotationStore,
};
use rand::Rng;
use tokio::sync::mpsc;

use crate::{
  Error, Result, clock::Clock, config::EngineConfig, shutdown::ShutdownListener,
};

/// What a single pass decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
  /// A new leader was recorded and queued for notification.
  Selected(Selection),
  /// The next occurrence already has a leader.
  Decided { occurrence: DateTime<Utc> },
  /// No meeting slot is configured.
  Unscheduled,
  /// Nobody is active; the occurrence stays undecided for now.
  EmptyRoster { occurrence: DateTime<Utc> },
}

pub struct SelectionLoop<S, R> {
  store:    Arc<S>,
  clock:    Arc<dyn Clock>,
  rng:      R,
  queue:    mpsc::UnboundedSender<Selection>,
  shutdown: ShutdownListener,
  config:   EngineConfig,
}

impl<S, R> SelectionLoop<S, R>
where
  S: RotationStore + 'static,
  R: Rng + Send + 'static,
{
  pub fn new(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    rng: R,
    queue: mpsc::UnboundedSender<Selection>,
    shutdown: ShutdownListener,
    config: EngineConfig,
  ) -> Self {
    Self { store, clock, rng, queue, shutdown, config }
  }

  /// One resolve/check/select pass. Never sleeps.
  pub async fn tick(&mut self) -> Result<Tick> {
    let now = self.clock.now();
    let slots = self.store.get_meeting_slots().await.map_err(Error::store)?;
    let Some((slot, occurrence)) = schedule::next_meeting(now, &slots) else {
      return Ok(Tick::Unscheduled);
    };
    let slot_id = slot.slot_id;
    tracing::debug!(meeting = %slot.describe(), %occurrence, "next occurrence resolved");

    if let Some(existing) = self
      .store
      .find_selection(slot_id, occurrence)
      .await
      .map_err(Error::store)?
    {
      tracing::debug!(leader = %existing.leader_name, %occurrence, "occurrence already decided");
      return Ok(Tick::Decided { occurrence });
    }

    let active = self
      .store
      .list_active_participants()
      .await
      .map_err(Error::store)?;
    let history = self.store.get_rotation_history().await.map_err(Error::store)?;

    let chosen = match selector::select(&active, &history, &mut self.rng) {
      Ok(p) => p.participant_id,
      Err(mlm_core::Error::EmptyRoster) => return Ok(Tick::EmptyRoster { occurrence }),
      Err(e) => return Err(e.into()),
    };

    match self.store.record_selection(slot_id, occurrence, chosen).await {
      Ok(selection) => {
        tracing::info!(
          leader = %selection.leader_name,
          %occurrence,
          "new leader selected"
        );
        if self.queue.send(selection.clone()).is_err() {
          tracing::debug!("notification queue closed; skipping hand-off");
        }
        Ok(Tick::Selected(selection))
      }
      Err(e) if e.is_already_decided() => {
        tracing::info!(%occurrence, "occurrence decided by another writer");
        Ok(Tick::Decided { occurrence })
      }
      Err(e) => Err(Error::store(e)),
    }
  }

  /// Run until shutdown. Stops between passes, never in the middle of one.
  pub async fn run(mut self) {
    tracing::info!("selection loop started");

    while !self.shutdown.is_triggered() {
      let stopped = match self.tick().await {
        Ok(Tick::Selected(_)) => continue,
        Ok(Tick::Decided { occurrence }) => {
          self.wait_until(occurrence + self.config.grace()).await
        }
        Ok(Tick::Unscheduled) => {
          tracing::warn!("no meetings scheduled; nothing to elect");
          self.back_off().await
        }
        Ok(Tick::EmptyRoster { occurrence }) => {
          tracing::warn!(%occurrence, "no active participants; leader not chosen");
          self.back_off().await
        }
        Err(e) => {
          tracing::error!(error = %e, "selection pass failed");
          self.back_off().await
        }
      };
      if stopped {
        break;
      }
    }

    tracing::info!("selection loop stopped");
  }

  /// Sleep in `poll_interval` steps until the clock reaches `deadline`.
  /// Returns `true` if shutdown interrupted the wait.
  async fn wait_until(&mut self, deadline: DateTime<Utc>) -> bool {
    let step = self.config.poll_interval();
    while self.clock.now() < deadline {
      if self.shutdown.sleep(step).await {
        return true;
      }
    }
    false
  }

  async fn back_off(&mut self) -> bool {
    let retry = self.config.retry_interval();
    self.shutdown.sleep(retry).await
  }
}
