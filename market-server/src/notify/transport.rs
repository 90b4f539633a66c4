//! Mail transports
//!
//! `SmtpTransport` speaks the minimal command sequence
//! EHLO → AUTH LOGIN → MAIL FROM → RCPT TO → DATA → QUIT over a plain
//! `TcpStream`, with one overall timeout per delivery. A transport with no
//! credential configured treats every send as a silent no-op.
//! `MemoryTransport` records messages for tests and local development.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::core::config::SmtpSettings;

/// A rendered, addressed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery failure. Absorbed by the dispatcher; never reaches the caller
/// that triggered the notification.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("smtp i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("smtp delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("smtp server rejected {command}: {reply}")]
    Rejected { command: &'static str, reply: String },
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError>;
}

/// Minimal SMTP client over the configured host/port.
pub struct SmtpTransport {
    settings: SmtpSettings,
}

impl SmtpTransport {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// False when no credential is configured; sends become no-ops.
    pub fn is_configured(&self) -> bool {
        self.settings.user.is_some() && self.settings.password.is_some()
    }

    async fn deliver(&self, message: &MailMessage) -> Result<(), TransportError> {
        let (Some(user), Some(password)) = (&self.settings.user, &self.settings.password) else {
            return Ok(());
        };
        let from = self.settings.from.as_deref().unwrap_or(user);

        let stream =
            TcpStream::connect((self.settings.host.as_str(), self.settings.port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut session = SmtpSession {
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        session.expect("greeting", "2").await?;

        session.command(&format!("EHLO {}", self.settings.host)).await?;
        session.expect("EHLO", "2").await?;

        session.command("AUTH LOGIN").await?;
        session.expect("AUTH LOGIN", "3").await?;
        session.command(&BASE64.encode(user)).await?;
        session.expect("AUTH username", "3").await?;
        session.command(&BASE64.encode(password)).await?;
        session.expect("AUTH password", "2").await?;

        session.command(&format!("MAIL FROM:<{from}>")).await?;
        session.expect("MAIL FROM", "2").await?;
        session.command(&format!("RCPT TO:<{}>", message.to)).await?;
        session.expect("RCPT TO", "2").await?;

        session.command("DATA").await?;
        session.expect("DATA", "3").await?;
        let payload = format!(
            "From: {from}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n.",
            message.to, message.subject, message.body
        );
        session.command(&payload).await?;
        session.expect("message body", "2").await?;

        // Best effort; the message is already accepted.
        let _ = session.command("QUIT").await;
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        if !self.is_configured() {
            tracing::debug!(to = %message.to, "No mail credential configured, skipping send");
            return Ok(());
        }
        match tokio::time::timeout(self.settings.timeout, self.deliver(message)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.settings.timeout)),
        }
    }
}

struct SmtpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl SmtpSession {
    async fn command(&mut self, line: &str) -> Result<(), TransportError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read one (possibly multi-line) reply and require the status class
    /// to start with `expected` ("2" or "3").
    async fn expect(
        &mut self,
        command: &'static str,
        expected: &str,
    ) -> Result<String, TransportError> {
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await?;
            if n == 0 {
                return Err(TransportError::Rejected {
                    command,
                    reply: "connection closed".into(),
                });
            }
            let line = line.trim_end().to_string();
            // "250-..." continues the reply, "250 ..." ends it.
            if line.len() >= 4 && line.as_bytes()[3] == b'-' {
                continue;
            }
            if line.starts_with(expected) {
                return Ok(line);
            }
            return Err(TransportError::Rejected { command, reply: line });
        }
    }
}

/// Records sends instead of performing them.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<MailMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("transport lock poisoned").clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("transport lock poisoned")
            .push(message.clone());
        Ok(())
    }
}
