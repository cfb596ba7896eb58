//! [`Rotation`] — the engine as seen by the CLI and the dashboard.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mlm_core::{
  schedule::{self, MeetingSlot},
  selection::Selection,
  store::RotationStore,
};
use rand::Rng;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
  Error, Result,
  clock::Clock,
  config::EngineConfig,
  notify::{Dispatcher, NotificationLoop, Notifier},
  selection::SelectionLoop,
  shutdown::Shutdown,
};

/// A running engine: both loops spawned on the tokio runtime, plus
/// read-only access to the rotation state.
pub struct Rotation<S> {
  store:        Arc<S>,
  clock:        Arc<dyn Clock>,
  shutdown:     Shutdown,
  selection:    JoinHandle<()>,
  notification: JoinHandle<()>,
}

impl<S> Rotation<S>
where
  S: RotationStore + 'static,
{
  /// Spawn the selection and notification loops. Pass `None` as the
  /// dispatcher to run with mail notification disabled.
  pub fn spawn<N, R>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    rng: R,
    dispatcher: Option<Dispatcher<N>>,
    config: EngineConfig,
  ) -> Self
  where
    N: Notifier,
    R: Rng + Send + 'static,
  {
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();

    let selection = tokio::spawn(
      SelectionLoop::new(
        store.clone(),
        clock.clone(),
        rng,
        tx,
        shutdown.listener(),
        config,
      )
      .run(),
    );
    let notification =
      tokio::spawn(NotificationLoop::new(dispatcher, rx, shutdown.listener()).run());

    Self { store, clock, shutdown, selection, notification }
  }

  /// The slot and timestamp of the next meeting, or `None` if no slot is
  /// configured.
  pub async fn get_next_occurrence(&self) -> Result<Option<(MeetingSlot, DateTime<Utc>)>> {
    let slots = self.store.get_meeting_slots().await.map_err(Error::store)?;
    Ok(
      schedule::next_meeting(self.clock.now(), &slots)
        .map(|(slot, at)| (slot.clone(), at)),
    )
  }

  pub async fn get_current_leader(&self) -> Result<Option<Selection>> {
    self.store.get_current_leader().await.map_err(Error::store)
  }

  pub async fn get_rotation_history(&self) -> Result<Vec<Selection>> {
    self.store.get_rotation_history().await.map_err(Error::store)
  }

  /// Ask both loops to stop after their current unit of work.
  pub fn trigger_shutdown(&self) { self.shutdown.trigger(); }

  /// A handle other components (e.g. the HTTP server) can use to observe or
  /// trigger the same shutdown.
  pub fn shutdown_handle(&self) -> Shutdown { self.shutdown.clone() }

  /// Wait for both loops to finish. Call after [`Self::trigger_shutdown`].
  pub async fn join(self) {
    for (name, handle) in [("selection", self.selection), ("notification", self.notification)] {
      if let Err(e) = handle.await {
        tracing::error!(task = name, error = %e, "engine task panicked");
      }
    }
  }
}
