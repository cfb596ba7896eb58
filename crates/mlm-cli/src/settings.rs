//! Layered configuration: built-in defaults, then the TOML file, then
//! `MLM__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use mlm_engine::{EngineConfig, MailConfig};
use serde::Deserialize;

/// Where the config file is looked for when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "~/.mlm/mlm.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub app:               AppConfig,
  pub db:                DbConfig,
  pub engine:            EngineConfig,
  pub mail_notification: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub name: String,
  pub host: String,
  pub port: u16,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      name: "Meeting Leader Manager".to_string(),
      host: "0.0.0.0".to_string(),
      port: 5000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
  pub path: PathBuf,
}

impl Default for DbConfig {
  fn default() -> Self { Self { path: PathBuf::from("~/.mlm/db.sqlite") } }
}

impl Settings {
  /// Load settings from `path` (missing file is fine) and the environment.
  pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
    let path = expand_tilde(path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH)));

    let settings = config::Config::builder()
      .add_source(config::File::from(path.clone()).required(false))
      .add_source(config::Environment::with_prefix("MLM").separator("__"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.db.path = expand_tilde(&settings.db.path);
    settings.mail_notification.template = expand_tilde(&settings.mail_notification.template);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

/// A commented example config with every option at its default.
pub fn sample() -> String {
  let defaults = Settings::default();
  let app = &defaults.app;
  let engine = &defaults.engine;
  let mail = &defaults.mail_notification;

  format!(
    r#"[app]
# Name shown on the dashboard.
#name = "{name}"
# Address the dashboard listens on.
#host = "{host}"
#port = {port}

[db]
# SQLite file holding members, meetings, and the rotation history.
#path = "{db}"

[engine]
# Sleep granularity in milliseconds; bounds how long shutdown takes.
#poll_interval_ms = {poll}
# Minutes after a meeting starts before the next one is elected.
#grace_minutes = {grace}
# Seconds to wait before retrying when no leader could be chosen.
#retry_interval_secs = {retry}

[mail_notification]
# Enable or disable mail notification.
#enabled = {enabled}
# E-mail address to send notification from.
#email_from = "{from}"
# SMTP server, host[:port].
#smtp_url = "{smtp}"
# Template for notification mail.
#template = "{template}"
# Subject line template.
#subject = "{subject}"
#login = ""
#password = ""
"#,
    name = app.name,
    host = app.host,
    port = app.port,
    db = defaults.db.path.display(),
    poll = engine.poll_interval_ms,
    grace = engine.grace_minutes,
    retry = engine.retry_interval_secs,
    enabled = mail.enabled,
    from = mail.email_from,
    smtp = mail.smtp_url,
    template = mail.template.display(),
    subject = mail.subject,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let settings = Settings::load(Some(Path::new("/nonexistent/mlm.toml"))).unwrap();
    assert_eq!(settings.app.port, 5000);
    assert!(!settings.mail_notification.enabled);
    assert_eq!(settings.engine.grace_minutes, 5);
  }

  #[test]
  fn file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mlm.toml");
    std::fs::write(
      &path,
      "[app]\nport = 8080\n\n[mail_notification]\nenabled = true\nemail_from = \"team@example.com\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.app.port, 8080);
    assert_eq!(settings.app.name, "Meeting Leader Manager");
    assert!(settings.mail_notification.enabled);
    assert_eq!(settings.mail_notification.email_from, "team@example.com");
  }

  #[test]
  fn sample_parses_as_toml_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.toml");
    std::fs::write(&path, sample()).unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.app.port, 5000);
  }
}
