//! Outgoing email.
//!
//! Every notification is best-effort: a failed send is logged and counted
//! but never fails the request that triggered it.

mod console;
mod smtp;
pub mod templates;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// A rendered email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Errors from a mail transport.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// An address could not be parsed.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// The message could not be built.
    #[error("failed to build email: {0}")]
    Build(String),

    /// The transport refused or failed the send.
    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Sends emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one email.
    ///
    /// # Errors
    ///
    /// Returns error if the message is invalid or the transport fails.
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Send and swallow the outcome, logging and counting failures.
pub async fn deliver(mailer: &dyn Mailer, email: Email) {
    let to = email.to.clone();
    let subject = email.subject.clone();
    match mailer.send(email).await {
        Ok(()) => tracing::debug!(%to, %subject, "Email sent"),
        Err(error) => {
            metrics::counter!("eventure.email.failed").increment(1);
            tracing::warn!(%to, %subject, %error, "Email delivery failed");
        },
    }
}

/// Send each email in turn without blocking the caller.
pub fn deliver_all_in_background(mailer: Arc<dyn Mailer>, emails: Vec<Email>) {
    if emails.is_empty() {
        return;
    }
    tokio::spawn(async move {
        for email in emails {
            deliver(mailer.as_ref(), email).await;
        }
    });
}

/// Keeps every email in memory; optionally fails every send.
#[derive(Clone, Debug, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    failing: bool,
}

impl RecordingMailer {
    /// Records and accepts every email.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every email with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    /// Emails accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(email);
        Ok(())
    }
}
