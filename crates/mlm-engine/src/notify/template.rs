//! Minijinja rendering of the leader notification.
//!
//! The body template comes from the configured file; the subject is a short
//! inline template. Both see the same variables: `username`, `date`,
//! `email_from`, and `email_to`.

use std::path::Path;

use minijinja::{Environment, context};
use mlm_core::selection::Selection;

use crate::{Error, Result, config::MailConfig};

use super::Message;

const BODY: &str = "body";
const SUBJECT: &str = "subject";

/// Renders a [`Message`] for a recorded selection.
#[derive(Debug)]
pub struct Renderer {
  env:        Environment<'static>,
  email_from: String,
}

impl Renderer {
  /// Compile `body` and `subject` templates. Syntax errors surface here, not
  /// at dispatch time.
  pub fn new(body: String, subject: String, email_from: String) -> Result<Self> {
    let mut env = Environment::new();
    env.add_template_owned(BODY, body)?;
    env.add_template_owned(SUBJECT, subject)?;
    Ok(Self { env, email_from })
  }

  /// Load the body template from `config.template`.
  pub fn from_config(config: &MailConfig) -> Result<Self> {
    let body = read_template(&config.template)?;
    Self::new(body, config.subject.clone(), config.email_from.clone())
  }

  pub fn render(&self, selection: &Selection, email_to: &str) -> Result<Message> {
    let ctx = context! {
      username   => selection.leader_name,
      date       => selection.display_date(),
      email_from => self.email_from,
      email_to   => email_to,
    };
    let subject = self.env.get_template(SUBJECT)?.render(&ctx)?;
    let body    = self.env.get_template(BODY)?.render(&ctx)?;
    Ok(Message { subject: subject.trim().to_string(), body })
  }
}

fn read_template(path: &Path) -> Result<String> {
  std::fs::read_to_string(path).map_err(|source| Error::TemplateRead {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;

  fn selection() -> Selection {
    Selection {
      selection_id:   Uuid::new_v4(),
      slot_id:        Uuid::new_v4(),
      occurrence:     Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap(),
      participant_id: Uuid::new_v4(),
      leader_name:    "Doe".into(),
      leader_contact: Some("doe@example.com".into()),
      recorded_at:    Utc::now(),
    }
  }

  #[test]
  fn renders_name_and_date() {
    let renderer = Renderer::new(
      "Hi {{ username }}, you lead on {{ date }}. -- {{ email_from }}".into(),
      "Leader for {{ date }}".into(),
      "mlm@example.com".into(),
    )
    .unwrap();

    let message = renderer.render(&selection(), "doe@example.com").unwrap();
    assert!(message.body.contains("Doe"));
    assert!(message.body.contains("14.10.26 (Wednesday) - 10:00 UTC"));
    assert!(message.body.contains("mlm@example.com"));
    assert_eq!(message.subject, "Leader for 14.10.26 (Wednesday) - 10:00 UTC");
  }

  #[test]
  fn syntax_error_fails_at_construction() {
    let result = Renderer::new("{% if %}".into(), "s".into(), "f@example.com".into());
    assert!(matches!(result, Err(Error::Template(_))));
  }

  #[test]
  fn missing_template_file_is_reported() {
    let config = MailConfig {
      template: "/definitely/not/here.html".into(),
      ..MailConfig::default()
    };
    assert!(matches!(Renderer::from_config(&config), Err(Error::TemplateRead { .. })));
  }

  #[test]
  fn loads_template_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail.html");
    std::fs::write(&path, "<p>{{ username }} to {{ email_to }}</p>").unwrap();

    let config = MailConfig { template: path, ..MailConfig::default() };
    let renderer = Renderer::from_config(&config).unwrap();
    let message = renderer.render(&selection(), "doe@example.com").unwrap();
    assert_eq!(message.body, "<p>Doe to doe@example.com</p>");
  }
}
