//! SMTP delivery through Lettre.

use super::{Email, MailError, Mailer};
use crate::config::EmailConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Sends emails over an authenticated SMTP relay.
///
/// A transport is built per message; sends run on the blocking pool.
#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from configuration.
    ///
    /// Returns `None` when no SMTP user is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the from address cannot be parsed.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, MailError> {
        let Some(user) = config.user.clone() else {
            return Ok(None);
        };
        let from_address = config.from.clone().unwrap_or_else(|| user.clone());
        let from = format!("Eventure <{from_address}>")
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: from_address,
                reason: e.to_string(),
            })?;

        Ok(Some(Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(user, config.password.clone().unwrap_or_default()),
            from,
        }))
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        Ok(SmtpTransport::relay(&self.host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let to: Mailbox = email.to.parse().map_err(|e: lettre::address::AddressError| {
            MailError::InvalidAddress { address: email.to.clone(), reason: e.to_string() }
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| MailError::Transport(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Transport(format!("email task failed: {e}")))?
        .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(user: Option<&str>, from: Option<&str>) -> EmailConfig {
        EmailConfig {
            host: "smtp.campus.edu".to_string(),
            port: 465,
            user: user.map(str::to_string),
            password: Some("app-password".to_string()),
            from: from.map(str::to_string),
        }
    }

    #[test]
    fn no_user_means_no_smtp() {
        assert!(SmtpMailer::from_config(&config(None, None)).unwrap().is_none());
    }

    #[test]
    fn from_defaults_to_the_smtp_user() {
        let mailer = SmtpMailer::from_config(&config(Some("events@campus.edu"), None))
            .unwrap()
            .unwrap();
        assert_eq!(mailer.from.email.to_string(), "events@campus.edu");
    }

    #[test]
    fn bad_from_address_is_rejected() {
        let err = SmtpMailer::from_config(&config(Some("events@campus.edu"), Some("nope")))
            .unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { .. }));
    }
}
