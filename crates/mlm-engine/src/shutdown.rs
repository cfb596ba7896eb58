//! Cooperative shutdown signal shared by both loops.
//!
//! A single [`Shutdown`] handle flips the flag once; every
//! [`ShutdownListener`] observes it at its next check or wakes from its
//! current sleep. Dropping every `Shutdown` handle counts as a trigger.

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;

/// The writer side. Cloning shares the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
  tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(false);
    Self { tx: Arc::new(tx) }
  }

  /// Ask both loops to stop. Idempotent.
  pub fn trigger(&self) {
    if !self.tx.send_replace(true) {
      tracing::info!("shutdown requested");
    }
  }

  pub fn is_triggered(&self) -> bool { *self.tx.borrow() }

  pub fn listener(&self) -> ShutdownListener {
    ShutdownListener { rx: self.tx.subscribe() }
  }
}

impl Default for Shutdown {
  fn default() -> Self { Self::new() }
}

/// The reader side, one per loop.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
  rx: watch::Receiver<bool>,
}

impl ShutdownListener {
  pub fn is_triggered(&self) -> bool { *self.rx.borrow() }

  /// Resolves once shutdown is triggered (or the writer is gone).
  pub async fn triggered(&mut self) {
    let _ = self.rx.wait_for(|stop| *stop).await;
  }

  /// Sleep for `duration` unless shutdown fires first. Returns `true` if the
  /// caller should stop.
  pub async fn sleep(&mut self, duration: Duration) -> bool {
    let woken = tokio::select! {
      _ = self.triggered() => true,
      _ = tokio::time::sleep(duration) => false,
    };
    woken || self.is_triggered()
  }
}
