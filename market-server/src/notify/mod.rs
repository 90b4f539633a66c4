//! Notification Module
//!
//! Localized email notifications, dispatched fire-and-forget: the business
//! operation that triggers a notification never waits on, or fails because
//! of, mail delivery.

pub mod dispatcher;
pub mod templates;
pub mod transport;

pub use dispatcher::NotificationDispatcher;
pub use templates::Locale;
pub use transport::{MailMessage, MailTransport, MemoryTransport, SmtpTransport, TransportError};

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Everything the system can tell a person about. Each variant carries the
/// values its template substitutes; rendering never reaches back into
/// storage.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Account created.
    Welcome { name: String },
    /// A farmer's listing went live.
    CropUploaded {
        name: String,
        crop_name: String,
        quantity_kg: Decimal,
    },
    /// A listing aged past its expiry date.
    CropExpired {
        name: String,
        crop_name: String,
        expiry_date: Option<NaiveDate>,
    },
    /// A buyer's want-ad went live.
    DealUploaded { name: String, crop_name: String },
    /// Buyer-facing checkout receipt.
    PurchaseConfirmation {
        name: String,
        invoice_id: String,
        total: Decimal,
    },
    /// Farmer-facing sale notice with the recomputed net payable.
    PurchaseNotification {
        name: String,
        crop_name: String,
        quantity_kg: Decimal,
        buyer_name: String,
        buyer_phone: Option<String>,
        net_amount: Decimal,
    },
}

impl Notification {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::CropUploaded { .. } => "crop_uploaded",
            Notification::CropExpired { .. } => "crop_expired",
            Notification::DealUploaded { .. } => "deal_uploaded",
            Notification::PurchaseConfirmation { .. } => "purchase_confirmation",
            Notification::PurchaseNotification { .. } => "purchase_notification",
        }
    }
}
