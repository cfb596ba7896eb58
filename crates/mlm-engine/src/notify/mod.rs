//! Notification hand-off: the consumer side of the selection queue.
//!
//! The loop pops selections in the order they were recorded and delivers one
//! message per entry, exactly once. A failed delivery is logged and dropped;
//! the selection itself is already durable, so nothing is retried or
//! re-queued. Entries still queued at shutdown are dropped.

pub mod smtp;
pub mod template;

use std::future::Future;

use mlm_core::selection::Selection;
use tokio::sync::mpsc;

use crate::{Error, Result, shutdown::ShutdownListener};

pub use smtp::SmtpNotifier;
pub use template::Renderer;

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub subject: String,
  pub body:    String,
}

/// Delivery transport. Implementations report success or failure; they do
/// not retry.
pub trait Notifier: Send + Sync + 'static {
  fn deliver<'a>(
    &'a self,
    to: &'a str,
    message: &'a Message,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Dispatcher ───────────────────────────────────────────────────────────────

/// Renders and delivers the notification for one selection.
#[derive(Debug)]
pub struct Dispatcher<N> {
  notifier: N,
  renderer: Renderer,
}

impl<N: Notifier> Dispatcher<N> {
  pub fn new(notifier: N, renderer: Renderer) -> Self { Self { notifier, renderer } }

  /// One delivery attempt.
  pub async fn dispatch(&self, selection: &Selection) -> Result<()> {
    let to = selection.leader_contact.as_deref().ok_or_else(|| {
      Error::Delivery(format!("{} has no contact address", selection.leader_name))
    })?;
    let message = self.renderer.render(selection, to)?;
    self.notifier.deliver(to, &message).await
  }
}

// ─── Loop ─────────────────────────────────────────────────────────────────────

/// Drains the hand-off queue until shutdown or until the producer goes away.
pub struct NotificationLoop<N> {
  dispatcher: Option<Dispatcher<N>>,
  queue:      mpsc::UnboundedReceiver<Selection>,
  shutdown:   ShutdownListener,
}

impl<N: Notifier> NotificationLoop<N> {
  /// `dispatcher` is `None` when mail notification is disabled; the loop then
  /// returns as soon as it is run.
  pub fn new(
    dispatcher: Option<Dispatcher<N>>,
    queue: mpsc::UnboundedReceiver<Selection>,
    shutdown: ShutdownListener,
  ) -> Self {
    Self { dispatcher, queue, shutdown }
  }

  pub async fn run(mut self) {
    let Some(dispatcher) = self.dispatcher.take() else {
      tracing::info!("mail notification disabled; notification loop not started");
      return;
    };
    tracing::info!("notification loop started");

    loop {
      if self.shutdown.is_triggered() {
        break;
      }

      let next = tokio::select! {
        biased;
        _ = self.shutdown.triggered() => None,
        item = self.queue.recv() => item,
      };
      let Some(selection) = next else {
        break;
      };

      match dispatcher.dispatch(&selection).await {
        Ok(()) => tracing::info!(
          leader = %selection.leader_name,
          occurrence = %selection.occurrence,
          "notification delivered"
        ),
        Err(e) => tracing::warn!(
          leader = %selection.leader_name,
          occurrence = %selection.occurrence,
          error = %e,
          "notification not delivered"
        ),
      }
    }

    tracing::info!("notification loop stopped");
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{Arc, Mutex},
    time::Duration,
  };

  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::shutdown::Shutdown;

  /// Records every delivery; fails for addresses containing "bounce".
  #[derive(Clone, Default)]
  struct Outbox {
    sent: Arc<Mutex<Vec<(String, Message)>>>,
  }

  impl Outbox {
    fn recipients(&self) -> Vec<String> {
      self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }
  }

  impl Notifier for Outbox {
    async fn deliver(&self, to: &str, message: &Message) -> Result<()> {
      if to.contains("bounce") {
        return Err(Error::Delivery("mailbox unavailable".into()));
      }
      self.sent.lock().unwrap().push((to.to_string(), message.clone()));
      Ok(())
    }
  }

  /// Triggers shutdown from inside the first delivery, then takes a while to
  /// finish it.
  struct InterruptingOutbox {
    outbox:   Outbox,
    shutdown: Shutdown,
  }

  impl Notifier for InterruptingOutbox {
    async fn deliver(&self, to: &str, message: &Message) -> Result<()> {
      self.shutdown.trigger();
      tokio::time::sleep(Duration::from_millis(20)).await;
      self.outbox.deliver(to, message).await
    }
  }

  fn renderer() -> Renderer {
    Renderer::new(
      "{{ username }} leads on {{ date }}".into(),
      "Leader: {{ username }}".into(),
      "mlm@example.com".into(),
    )
    .unwrap()
  }

  fn selection(name: &str, contact: Option<&str>, week: i64) -> Selection {
    Selection {
      selection_id:   Uuid::new_v4(),
      slot_id:        Uuid::new_v4(),
      occurrence:     Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
        + chrono::Duration::weeks(week),
      participant_id: Uuid::new_v4(),
      leader_name:    name.into(),
      leader_contact: contact.map(str::to_string),
      recorded_at:    Utc::now(),
    }
  }

  #[tokio::test]
  async fn delivers_in_fifo_order_and_survives_failures() {
    let outbox = Outbox::default();
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(selection("a", Some("a@example.com"), 0)).unwrap();
    tx.send(selection("bounce", Some("bounce@example.com"), 1)).unwrap();
    tx.send(selection("nomail", None, 2)).unwrap();
    tx.send(selection("c", Some("c@example.com"), 3)).unwrap();
    drop(tx);

    let dispatcher = Dispatcher::new(outbox.clone(), renderer());
    NotificationLoop::new(Some(dispatcher), rx, shutdown.listener())
      .run()
      .await;

    assert_eq!(outbox.recipients(), ["a@example.com", "c@example.com"]);
    let sent = outbox.sent.lock().unwrap();
    assert_eq!(sent[0].1.subject, "Leader: a");
    assert!(sent[0].1.body.starts_with("a leads on 14.10.26"));
  }

  #[tokio::test]
  async fn disabled_loop_returns_immediately() {
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel::<Selection>();

    let handle = tokio::spawn(
      NotificationLoop::<Outbox>::new(None, rx, shutdown.listener()).run(),
    );
    tokio::time::timeout(Duration::from_secs(5), handle)
      .await
      .expect("loop should exit")
      .unwrap();

    // The receiver is gone, so producers see a closed queue.
    assert!(tx.send(selection("a", Some("a@example.com"), 0)).is_err());
  }

  #[tokio::test]
  async fn idle_loop_stops_on_shutdown() {
    let outbox = Outbox::default();
    let shutdown = Shutdown::new();
    let (_tx, rx) = mpsc::unbounded_channel();

    let dispatcher = Dispatcher::new(outbox.clone(), renderer());
    let handle = tokio::spawn(NotificationLoop::new(Some(dispatcher), rx, shutdown.listener()).run());

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
      .await
      .expect("loop should stop")
      .unwrap();
    assert!(outbox.recipients().is_empty());
  }

  #[tokio::test]
  async fn queued_entries_are_dropped_at_shutdown() {
    let outbox = Outbox::default();
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();

    for (week, name) in ["a", "b", "c"].into_iter().enumerate() {
      tx.send(selection(name, Some(format!("{name}@example.com").as_str()), week as i64))
        .unwrap();
    }
    shutdown.trigger();

    let dispatcher = Dispatcher::new(outbox.clone(), renderer());
    tokio::time::timeout(
      Duration::from_secs(5),
      NotificationLoop::new(Some(dispatcher), rx, shutdown.listener()).run(),
    )
    .await
    .expect("loop should stop");

    assert!(outbox.recipients().is_empty());
  }

  #[tokio::test]
  async fn delivery_in_flight_completes_before_stopping() {
    let outbox = Outbox::default();
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();

    for (week, name) in ["a", "b", "c"].into_iter().enumerate() {
      tx.send(selection(name, Some(format!("{name}@example.com").as_str()), week as i64))
        .unwrap();
    }

    let notifier = InterruptingOutbox { outbox: outbox.clone(), shutdown: shutdown.clone() };
    let dispatcher = Dispatcher::new(notifier, renderer());
    tokio::time::timeout(
      Duration::from_secs(5),
      NotificationLoop::new(Some(dispatcher), rx, shutdown.listener()).run(),
    )
    .await
    .expect("loop should stop");

    assert_eq!(outbox.recipients(), ["a@example.com"]);
  }
}
