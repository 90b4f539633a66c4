//! Notification dispatcher
//!
//! Fire-and-forget: rendering happens inline, delivery runs on a detached
//! task. The triggering operation has already committed by the time a
//! delivery can fail, so failures are logged and dropped.

use std::sync::Arc;

use super::templates::{self, Locale};
use super::transport::MailTransport;
use super::Notification;

#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    /// Send `notification` to `recipient` in `locale`, detached. A missing
    /// or blank recipient skips the send; the caller never observes a
    /// delivery outcome either way.
    pub fn dispatch(&self, recipient: Option<&str>, notification: Notification, locale: Locale) {
        let Some(to) = recipient.map(str::trim).filter(|r| !r.is_empty()) else {
            tracing::debug!(kind = %notification.kind(), "No recipient address, skipping notification");
            return;
        };

        let message = templates::render(to, &notification, locale);
        let kind = notification.kind();
        let transport = self.transport.clone();

        tokio::spawn(async move {
            match transport.send(&message).await {
                Ok(()) => {
                    tracing::debug!(kind = %kind, to = %message.to, "Notification dispatched")
                }
                Err(e) => {
                    tracing::warn!(kind = %kind, to = %message.to, error = %e, "Notification delivery failed")
                }
            }
        });
    }
}
