//! Deal Model
//!
//! A buyer's standing want-ad for a crop. Mutated only by its owning buyer:
//! quantity may decrease, the delivery date may only move forward.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Deal entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub buyer_id: Option<i64>,
    pub buyer_phone: Option<String>,
    pub category: Option<String>,
    pub crop_name: String,
    pub variety: Option<String>,
    pub quantity_kg: Option<Decimal>,
    pub delivery_date: Option<NaiveDate>,
    pub image_path: Option<String>,
    /// Unix millis.
    pub created_at: i64,
}

/// Create deal payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealCreate {
    pub buyer_id: Option<i64>,
    pub buyer_phone: Option<String>,
    pub category: Option<String>,
    pub crop_name: String,
    pub variety: Option<String>,
    pub quantity_kg: Option<Decimal>,
    pub delivery_date: Option<NaiveDate>,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

/// Update deal payload (owner only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealUpdate {
    pub quantity_kg: Option<Decimal>,
    pub delivery_date: Option<NaiveDate>,
}

impl DealUpdate {
    pub fn is_empty(&self) -> bool {
        self.quantity_kg.is_none() && self.delivery_date.is_none()
    }
}
