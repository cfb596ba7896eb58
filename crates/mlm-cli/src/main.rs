//! `mlm` — meeting leader manager.
//!
//! # Usage
//!
//! ```text
//! mlm members add alice --email alice@example.com
//! mlm meeting add --weekday wednesday --time 10:00
//! mlm start
//! ```
//!
//! Settings come from `~/.mlm/mlm.toml` (or `--config`), overridden by
//! `MLM__SECTION__KEY` environment variables. `mlm sample-config` prints a
//! starting point.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mlm", version, about = "Rotate the meeting leader fairly across a team")]
struct Cli {
  /// Path to the TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage the team roster.
  Members {
    #[command(subcommand)]
    action: MembersAction,
  },
  /// Manage weekly meeting slots.
  Meeting {
    #[command(subcommand)]
    action: MeetingAction,
  },
  /// Print every past leader, newest first.
  History,
  /// Print the current leader.
  Leader,
  /// Print the next meeting.
  Next,
  /// Print an example config file.
  SampleConfig,
  /// Run the rotation engine and the dashboard until interrupted.
  Start,
}

#[derive(Subcommand, Debug)]
enum MembersAction {
  /// Add a member to the rotation.
  Add {
    name:  String,
    /// Address the notification mail is sent to.
    #[arg(long)]
    email: Option<String>,
  },
  /// List active members with how often they have led.
  List,
  /// Remove a member from the rotation; their history is kept.
  Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum MeetingAction {
  /// Add a weekly slot.
  Add {
    /// Day of the week, e.g. `wednesday` or `wed`.
    #[arg(long)]
    weekday: String,
    /// UTC start time as HH:MM.
    #[arg(long)]
    time:    String,
  },
  /// List weekly slots.
  List,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if matches!(cli.command, Command::SampleConfig) {
    print!("{}", settings::sample());
    return Ok(());
  }

  let settings = Settings::load(cli.config.as_deref())?;

  if matches!(cli.command, Command::Start) {
    return commands::start(settings).await;
  }

  let store = commands::open_store(&settings.db.path).await?;
  match cli.command {
    Command::Members { action } => match action {
      MembersAction::Add { name, email } => commands::members_add(&store, name, email).await,
      MembersAction::List => commands::members_list(&store).await,
      MembersAction::Delete { name } => commands::members_delete(&store, &name).await,
    },
    Command::Meeting { action } => match action {
      MeetingAction::Add { weekday, time } => commands::meeting_add(&store, &weekday, &time).await,
      MeetingAction::List => commands::meeting_list(&store).await,
    },
    Command::History => commands::history(&store).await,
    Command::Leader => commands::leader(&store).await,
    Command::Next => commands::next(&store).await,
    Command::SampleConfig | Command::Start => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_valid() { Cli::command().debug_assert(); }

  #[test]
  fn parses_meeting_add() {
    let cli = Cli::parse_from(["mlm", "meeting", "add", "--weekday", "wed", "--time", "10:00"]);
    match cli.command {
      Command::Meeting { action: MeetingAction::Add { weekday, time } } => {
        assert_eq!(weekday, "wed");
        assert_eq!(time, "10:00");
      }
      other => panic!("unexpected command {other:?}"),
    }
  }

  #[test]
  fn parses_member_with_email() {
    let cli = Cli::parse_from(["mlm", "members", "add", "alice", "--email", "a@example.com"]);
    match cli.command {
      Command::Members { action: MembersAction::Add { name, email } } => {
        assert_eq!(name, "alice");
        assert_eq!(email.as_deref(), Some("a@example.com"));
      }
      other => panic!("unexpected command {other:?}"),
    }
  }
}
