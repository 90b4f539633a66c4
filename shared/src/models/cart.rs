//! Cart Model
//!
//! Two physically separate ledgers exist — one for farmer-role owners, one
//! for buyer-role owners. `CartKind` selects the table; line ids are only
//! meaningful within their own ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which ledger a cart operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartKind {
    Farmer,
    Buyer,
}

impl CartKind {
    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            CartKind::Farmer => "cart",
            CartKind::Buyer => "cart_buyer",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CartKind::Farmer => "farmer",
            CartKind::Buyer => "buyer",
        }
    }
}

/// Cart owner filter. The filter doubles as the authorization mechanism:
/// a mutation whose filter matches zero rows is rejected.
#[derive(Debug, Clone)]
pub struct CartOwner {
    pub kind: CartKind,
    pub id: Option<i64>,
    pub phone: Option<String>,
}

impl CartOwner {
    pub fn has_identity(&self) -> bool {
        self.id.is_some() || self.phone.is_some()
    }
}

/// Cart line entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub owner_role: String,
    pub owner_id: Option<i64>,
    pub owner_phone: Option<String>,
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
    pub variety: Option<String>,
    pub quantity_kg: Decimal,
    pub price_per_kg: Option<Decimal>,
    /// quantity_kg × price_per_kg, computed at write time.
    pub total_price: Option<Decimal>,
    pub image_path: Option<String>,
    /// Unix millis.
    pub created_at: i64,
}

/// One item of an add request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
    pub variety: Option<String>,
    pub quantity_kg: Decimal,
    pub price_per_kg: Option<Decimal>,
    pub image_path: Option<String>,
}

/// Per-item result of an add request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAddOutcome {
    pub id: i64,
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
    /// `"duplicate_skipped"` when an existing line for (owner, crop) was
    /// returned instead of inserting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Cart line update payload; total_price is recomputed from the merged
/// quantity/price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartLineUpdate {
    pub quantity_kg: Option<Decimal>,
    pub price_per_kg: Option<Decimal>,
}

impl CartLineUpdate {
    pub fn is_empty(&self) -> bool {
        self.quantity_kg.is_none() && self.price_per_kg.is_none()
    }
}
