// src/utils/mail.rs

use std::{fmt, path::PathBuf};

use async_trait::async_trait;

/// Delivery failure reported by a [`Mailer`].
#[derive(Debug)]
pub struct MailError(pub String);

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mail delivery failed: {}", self.0)
    }
}

impl std::error::Error for MailError {}

/// Outgoing mail collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Subject and body of the signup confirmation mail.
pub fn confirmation_message(username: &str, code: &str) -> (String, String) {
    (
        "Confirmation code".to_string(),
        format!(
            "Hello, {}!\n\nUse this code to obtain your access token: {}\n",
            username, code
        ),
    )
}

/// Development mailer: writes every message to the log.
pub struct LogMailer {
    pub from: String,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tracing::info!(from = %self.from, %to, %subject, "outgoing mail:\n{}", body);
        Ok(())
    }
}

/// Writes each message to its own file under `dir`, like a local outbox.
pub struct FileMailer {
    pub from: String,
    pub dir: PathBuf,
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MailError(e.to_string()))?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let path = self
            .dir
            .join(format!("{}-{}.eml", stamp, uuid::Uuid::new_v4().simple()));
        let message = format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            self.from, to, subject, body
        );

        tokio::fs::write(&path, message)
            .await
            .map_err(|e| MailError(e.to_string()))?;
        tracing::debug!(path = %path.display(), "mail written to outbox");
        Ok(())
    }
}
