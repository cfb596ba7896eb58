//! Engine and mail configuration, deserialised from the `[engine]` and
//! `[mail_notification]` sections of the config file.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

// ─── Engine ───────────────────────────────────────────────────────────────────

/// Timing knobs for the selection and notification loops.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Granularity of every sleep; bounds how long shutdown takes to be seen.
  pub poll_interval_ms:    u64,
  /// How long after an occurrence starts before the next one is resolved.
  pub grace_minutes:       u32,
  /// Back-off before retrying a tick that could not decide (no slots, no
  /// active participants, storage failure).
  pub retry_interval_secs: u64,
}

impl EngineConfig {
  pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms.max(1)) }

  pub fn grace(&self) -> chrono::Duration { chrono::Duration::minutes(i64::from(self.grace_minutes)) }

  pub fn retry_interval(&self) -> Duration { Duration::from_secs(self.retry_interval_secs) }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms:    1_000,
      grace_minutes:       5,
      retry_interval_secs: 30,
    }
  }
}

// ─── Mail ─────────────────────────────────────────────────────────────────────

/// Outbound mail settings. Consumed as-is by the SMTP notifier and the
/// template renderer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
  pub enabled:    bool,
  /// Sender address, e.g. `"Meeting Leader Manager <mlm@example.com>"`.
  pub email_from: String,
  /// `host[:port]`; port defaults to 587 (STARTTLS).
  pub smtp_url:   String,
  /// Path to the minijinja body template.
  pub template:   PathBuf,
  /// minijinja template for the subject line.
  pub subject:    String,
  pub login:      String,
  pub password:   String,
}

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      enabled:    false,
      email_from: "example@example.com".to_string(),
      smtp_url:   "smtp.gmail.com:587".to_string(),
      template:   PathBuf::from("templates/email_template.html"),
      subject:    "You are leading the meeting on {{ date }}".to_string(),
      login:      String::new(),
      password:   String::new(),
    }
  }
}
