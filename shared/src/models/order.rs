//! Order & Purchase Notification Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Buyer contact details attached to a checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyerContact {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One line of a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub crop_id: Option<i64>,
    /// Explicit seller; resolved from the listing when absent.
    pub farmer_id: Option<i64>,
    pub crop_name: String,
    pub variety: Option<String>,
    pub quantity_kg: Decimal,
    pub price_per_kg: Decimal,
}

/// Checkout payload. The invoice id is generated when absent so that all
/// lines of one checkout share it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub invoice_id: Option<String>,
    pub buyer: BuyerContact,
    pub payment_method: String,
    pub lines: Vec<CheckoutLine>,
}

/// What a completed checkout recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub invoice_id: String,
    pub order_ids: Vec<i64>,
    /// Gross total across all lines (before deductions).
    pub gross_total: Decimal,
    /// Distinct farmers that received a sale notice.
    pub farmers_notified: usize,
}

/// Settlement ledger entry. Rows sharing an invoice/farmer pair are later
/// summed to recompute the authoritative net payable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerOrder {
    pub id: i64,
    pub invoice_id: String,
    pub farmer_id: i64,
    pub buyer_id: Option<i64>,
    pub crop_name: String,
    pub quantity_kg: Decimal,
    pub price_per_kg: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    /// Unix millis.
    pub created_at: i64,
}

/// Farmer-facing fan-out record, one per checkout line. Independent of the
/// email side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseNotification {
    pub id: i64,
    pub farmer_id: Option<i64>,
    pub farmer_phone: Option<String>,
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
    pub variety: Option<String>,
    pub quantity_kg: Option<Decimal>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub is_read: bool,
    /// Unix millis.
    pub created_at: i64,
}
