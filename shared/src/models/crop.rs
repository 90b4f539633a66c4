//! Crop Listing Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A farmer's crop for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropListing {
    pub id: i64,
    /// Weak reference into `person_farmer`; may be unresolved for legacy rows.
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    pub category: String,
    pub crop_name: String,
    pub variety: Option<String>,
    pub quantity_kg: Decimal,
    pub price_per_kg: Option<Decimal>,
    /// ISO date; listings past this date age out and notify the owner once.
    pub expiry_date: Option<NaiveDate>,
    pub image_path: Option<String>,
    /// Unix millis.
    pub created_at: i64,
}

/// Create listing payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropListingCreate {
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    pub category: String,
    pub crop_name: String,
    pub variety: Option<String>,
    pub quantity_kg: Decimal,
    pub price_per_kg: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    /// Raw image bytes; stored opaquely, only the resulting path is kept.
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

/// Update listing payload. Quantity may only decrease.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropListingUpdate {
    pub price_per_kg: Option<Decimal>,
    pub seller_phone: Option<String>,
    pub quantity_kg: Option<Decimal>,
}

impl CropListingUpdate {
    pub fn is_empty(&self) -> bool {
        self.price_per_kg.is_none() && self.seller_phone.is_none() && self.quantity_kg.is_none()
    }
}

/// Listing query filter.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub seller_id: Option<i64>,
    pub seller_phone: Option<String>,
    pub category: Option<String>,
}
