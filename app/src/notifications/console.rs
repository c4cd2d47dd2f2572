//! Console delivery for development.

use super::{Email, MailError, Mailer};
use async_trait::async_trait;
use tracing::info;

/// Logs emails instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    /// Create a console mailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "📧 Email (development mode)\n{}",
            email.html
        );
        Ok(())
    }
}
