//! SMTP delivery via `lettre` over STARTTLS.

use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message as MailMessage, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};

use crate::{Error, Result, config::MailConfig};

use super::{Message, Notifier};

const DEFAULT_PORT: u16 = 587;

/// Sends notifications as HTML mail through one SMTP relay.
#[derive(Debug)]
pub struct SmtpNotifier {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpNotifier {
  /// Build the transport from `[mail_notification]`. Credentials are attached
  /// only when `login` is non-empty.
  pub fn from_config(config: &MailConfig) -> Result<Self> {
    let from: Mailbox = config
      .email_from
      .parse()
      .map_err(|e: lettre::address::AddressError| Error::Config(format!("email_from: {e}")))?;

    let (host, port) = split_smtp_url(&config.smtp_url)?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
      .map_err(|e| Error::Config(e.to_string()))?
      .port(port);
    if !config.login.is_empty() {
      builder = builder.credentials(Credentials::new(
        config.login.clone(),
        config.password.clone(),
      ));
    }

    Ok(Self { transport: builder.build(), from })
  }
}

impl Notifier for SmtpNotifier {
  async fn deliver(&self, to: &str, message: &Message) -> Result<()> {
    let to: Mailbox = to
      .parse()
      .map_err(|e: lettre::address::AddressError| Error::Delivery(format!("recipient {to:?}: {e}")))?;

    let email = MailMessage::builder()
      .from(self.from.clone())
      .to(to)
      .subject(&message.subject)
      .header(ContentType::TEXT_HTML)
      .body(message.body.clone())
      .map_err(|e| Error::Delivery(e.to_string()))?;

    self
      .transport
      .send(email)
      .await
      .map_err(|e| Error::Delivery(e.to_string()))?;
    Ok(())
  }
}

/// `host[:port]` → `(host, port)`.
fn split_smtp_url(url: &str) -> Result<(&str, u16)> {
  match url.rsplit_once(':') {
    Some((host, port)) => {
      let port = port
        .parse()
        .map_err(|_| Error::Config(format!("smtp_url: bad port in {url:?}")))?;
      Ok((host, port))
    }
    None if !url.is_empty() => Ok((url, DEFAULT_PORT)),
    None => Err(Error::Config("smtp_url is empty".to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn smtp_url_with_and_without_port() {
    assert_eq!(split_smtp_url("smtp.gmail.com:587").unwrap(), ("smtp.gmail.com", 587));
    assert_eq!(split_smtp_url("mail.example.com").unwrap(), ("mail.example.com", 587));
    assert!(split_smtp_url("mail.example.com:smtp").is_err());
    assert!(split_smtp_url("").is_err());
  }

  #[test]
  fn from_config_valid() {
    let config = MailConfig {
      email_from: "MLM <mlm@example.com>".into(),
      smtp_url:   "smtp.example.com:2525".into(),
      login:      "mlm".into(),
      password:   "secret".into(),
      ..MailConfig::default()
    };
    assert!(SmtpNotifier::from_config(&config).is_ok());
  }

  #[test]
  fn from_config_invalid_sender() {
    let config = MailConfig { email_from: "not-an-email".into(), ..MailConfig::default() };
    let err = SmtpNotifier::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("email_from"), "got: {err}");
  }
}
