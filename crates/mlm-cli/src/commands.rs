//! Subcommand implementations. Each opens the store from settings, does one
//! thing, and prints the result.

use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::{Context as _, Result, bail};
use axum::Router;
use mlm_core::{
  participant::{NewParticipant, Participant},
  schedule,
  store::RotationStore,
};
use mlm_engine::{
  Rotation, SystemClock,
  notify::{Dispatcher, Renderer, SmtpNotifier},
};
use mlm_store_sqlite::SqliteStore;
use rand::{SeedableRng, rngs::StdRng};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::settings::Settings;

// ─── Store ────────────────────────────────────────────────────────────────────

/// Open the SQLite file named in `[db]`, creating its directory if needed.
pub async fn open_store(path: &Path) -> Result<SqliteStore> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

// ─── Members ──────────────────────────────────────────────────────────────────

pub async fn members_add(store: &SqliteStore, name: String, email: Option<String>) -> Result<()> {
  let mut input = NewParticipant::new(name);
  input.contact = email;
  let added = store.add_participant(input).await?;
  println!("Added {}.", added.name);
  Ok(())
}

pub async fn members_list(store: &SqliteStore) -> Result<()> {
  let members = store.list_active_participants().await?;
  if members.is_empty() {
    println!("No members yet. Add one with `mlm members add <name>`.");
    return Ok(());
  }
  print_table(&["Name", "E-mail", "Led"], members.iter().map(member_row).collect());
  Ok(())
}

fn member_row(p: &Participant) -> Vec<String> {
  vec![
    p.name.clone(),
    p.contact.clone().unwrap_or_else(|| "-".into()),
    p.fairness_score.to_string(),
  ]
}

pub async fn members_delete(store: &SqliteStore, name: &str) -> Result<()> {
  let removed = store.deactivate_participant(name).await?;
  println!("Removed {} from the rotation.", removed.name);
  Ok(())
}

// ─── Meetings ─────────────────────────────────────────────────────────────────

pub async fn meeting_add(store: &SqliteStore, weekday: &str, time: &str) -> Result<()> {
  let weekday = schedule::parse_weekday(weekday)?;
  let time = schedule::parse_time(time)?;
  let slot = store.add_meeting_slot(weekday, time).await?;
  println!("Added {}.", slot.describe());
  Ok(())
}

pub async fn meeting_list(store: &SqliteStore) -> Result<()> {
  let slots = store.get_meeting_slots().await?;
  if slots.is_empty() {
    println!("No meetings scheduled.");
  }
  for slot in slots {
    println!("{}", slot.describe());
  }
  Ok(())
}

// ─── Rotation ─────────────────────────────────────────────────────────────────

pub async fn history(store: &SqliteStore) -> Result<()> {
  let history = store.get_rotation_history().await?;
  if history.is_empty() {
    println!("No leader has been chosen yet.");
    return Ok(());
  }
  let rows = history
    .iter()
    .rev()
    .map(|s| vec![s.display_date(), s.leader_name.clone()])
    .collect();
  print_table(&["Meeting", "Leader"], rows);
  Ok(())
}

pub async fn leader(store: &SqliteStore) -> Result<()> {
  match store.get_current_leader().await? {
    Some(s) => println!("{} leads the meeting on {}", s.leader_name, s.display_date()),
    None => println!("No leader has been chosen yet."),
  }
  Ok(())
}

pub async fn next(store: &SqliteStore) -> Result<()> {
  let slots = store.get_meeting_slots().await?;
  match schedule::next_meeting(chrono::Utc::now(), &slots) {
    Some((slot, at)) => {
      println!("{}, next on {}", slot.describe(), at.format("%d.%m.%y (%A) - %H:%M UTC"))
    }
    None => println!("No meetings scheduled."),
  }
  Ok(())
}

// ─── Server ───────────────────────────────────────────────────────────────────

/// Run the engine and the dashboard until Ctrl-C.
pub async fn start(settings: Settings) -> Result<()> {
  let store = Arc::new(open_store(&settings.db.path).await?);

  let mail = &settings.mail_notification;
  let dispatcher = if mail.enabled {
    let notifier = SmtpNotifier::from_config(mail).context("invalid [mail_notification]")?;
    let renderer = Renderer::from_config(mail).context("failed to load mail template")?;
    Some(Dispatcher::new(notifier, renderer))
  } else {
    None
  };

  let rotation = Rotation::spawn(
    store.clone(),
    Arc::new(SystemClock),
    StdRng::from_entropy(),
    dispatcher,
    settings.engine.clone(),
  );

  if let Some((slot, at)) = rotation.get_next_occurrence().await? {
    tracing::info!(slot = %slot.describe(), occurrence = %at, "next meeting");
  } else {
    tracing::warn!("no meetings scheduled; add one with `mlm meeting add`");
  }

  let app = Router::new()
    .nest("/api", mlm_api::api_router(store))
    .layer(TraceLayer::new_for_http());

  let address: SocketAddr = format!("{}:{}", settings.app.host, settings.app.port)
    .parse()
    .with_context(|| format!("invalid listen address {}:{}", settings.app.host, settings.app.port))?;
  let listener = TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("{} listening on http://{address}", settings.app.name);

  let mut stop = rotation.shutdown_handle().listener();
  let mut server = tokio::spawn(async move {
    axum::serve(listener, app)
      .with_graceful_shutdown(async move { stop.triggered().await })
      .await
  });

  let early = tokio::select! {
    res = tokio::signal::ctrl_c() => {
      res.context("failed to listen for Ctrl-C")?;
      tracing::info!("interrupt received, shutting down");
      None
    }
    res = &mut server => Some(res),
  };

  rotation.trigger_shutdown();
  rotation.join().await;

  let served = match early {
    Some(res) => res,
    None => server.await,
  };
  match served.context("server task panicked")? {
    Ok(()) => Ok(()),
    Err(e) => bail!("server error: {e}"),
  }
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
  let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
  for row in &rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  let line = |cells: &[String]| {
    cells
      .iter()
      .zip(&widths)
      .map(|(c, w)| format!("{c:<width$}", width = *w))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
  println!("{}", line(&header));
  println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
  for row in &rows {
    println!("{}", line(row));
  }
}
