//! Crop Repository
//!
//! Listing rows plus the expiry tombstone table. A tombstone row per crop id
//! is what makes expiry notification exactly-once: the insert either lands
//! (first observer) or hits the primary key (someone else already told the
//! farmer).

use crate::core::error::MarketResult;
use shared::models::crop::{CropListing, ListingFilter};
use shared::util::now_millis;
use sqlx::Row;
use sqlx::any::AnyRow;
use sqlx::AnyPool;

fn map_listing(row: &AnyRow) -> MarketResult<CropListing> {
    Ok(CropListing {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        seller_name: row.try_get("seller_name")?,
        seller_phone: row.try_get("seller_phone")?,
        category: row.try_get("category")?,
        crop_name: row.try_get("crop_name")?,
        variety: row.try_get("variety")?,
        quantity_kg: super::get_decimal(row, "quantity_kg")?,
        price_per_kg: super::get_opt_decimal(row, "price_per_kg")?,
        expiry_date: super::get_opt_date(row, "expiry_date")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
    })
}

const COLS: &str = "id, seller_id, seller_name, seller_phone, category, crop_name, variety, \
                    quantity_kg, price_per_kg, expiry_date, image_path, created_at";

pub struct NewListingRow<'a> {
    pub seller_id: Option<i64>,
    pub seller_name: Option<&'a str>,
    pub seller_phone: Option<&'a str>,
    pub category: &'a str,
    pub crop_name: &'a str,
    pub variety: Option<&'a str>,
    pub quantity_kg: &'a rust_decimal::Decimal,
    pub price_per_kg: Option<&'a rust_decimal::Decimal>,
    pub expiry_date: Option<chrono::NaiveDate>,
    pub image_path: Option<&'a str>,
}

pub async fn insert(pool: &AnyPool, row: NewListingRow<'_>) -> MarketResult<i64> {
    let result = sqlx::query(
        "INSERT INTO crops (seller_id, seller_name, seller_phone, category, crop_name, variety, \
         quantity_kg, price_per_kg, expiry_date, image_path, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.seller_id)
    .bind(row.seller_name)
    .bind(row.seller_phone)
    .bind(row.category)
    .bind(row.crop_name)
    .bind(row.variety)
    .bind(super::dec_text(row.quantity_kg))
    .bind(row.price_per_kg.map(super::dec_text))
    .bind(row.expiry_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(row.image_path)
    .bind(now_millis())
    .execute(pool)
    .await?;
    super::inserted_id(&result)
}

pub async fn find_by_id(pool: &AnyPool, id: i64) -> MarketResult<Option<CropListing>> {
    let sql = format!("SELECT {COLS} FROM crops WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(map_listing).transpose()
}

/// List listings newest-first, optionally narrowed by seller and category.
pub async fn list(pool: &AnyPool, filter: &ListingFilter) -> MarketResult<Vec<CropListing>> {
    let sql = format!(
        "SELECT {COLS} FROM crops WHERE \
         (? IS NULL OR seller_id = ?) \
         AND (? IS NULL OR seller_phone = ?) \
         AND (? IS NULL OR category = ?) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(filter.seller_id)
        .bind(filter.seller_id)
        .bind(filter.seller_phone.as_deref())
        .bind(filter.seller_phone.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.category.as_deref())
        .fetch_all(pool)
        .await?;
    rows.iter().map(map_listing).collect()
}

/// Apply the already-validated field changes to one listing.
pub async fn update_fields(
    pool: &AnyPool,
    id: i64,
    price_per_kg: Option<&rust_decimal::Decimal>,
    seller_phone: Option<&str>,
    quantity_kg: Option<&rust_decimal::Decimal>,
) -> MarketResult<u64> {
    let result = sqlx::query(
        "UPDATE crops SET \
         price_per_kg = COALESCE(?, price_per_kg), \
         seller_phone = COALESCE(?, seller_phone), \
         quantity_kg = COALESCE(?, quantity_kg) \
         WHERE id = ?",
    )
    .bind(price_per_kg.map(super::dec_text))
    .bind(seller_phone)
    .bind(quantity_kg.map(super::dec_text))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &AnyPool, id: i64) -> MarketResult<u64> {
    let result = sqlx::query("DELETE FROM crops WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Listings whose expiry date has passed and which have no tombstone yet.
pub async fn expired_unnotified(
    pool: &AnyPool,
    today_iso: &str,
) -> MarketResult<Vec<CropListing>> {
    let sql = format!(
        "SELECT {COLS} FROM crops c \
         WHERE c.expiry_date IS NOT NULL AND c.expiry_date < ? \
         AND NOT EXISTS (SELECT 1 FROM expiry_notifications n WHERE n.crop_id = c.id)"
    );
    let rows = sqlx::query(&sql).bind(today_iso).fetch_all(pool).await?;
    rows.iter().map(map_listing).collect()
}

/// Record that the expiry notice for `crop_id` has been claimed. Returns
/// false when another writer got there first (primary-key collision).
pub async fn insert_tombstone(pool: &AnyPool, crop_id: i64) -> MarketResult<bool> {
    let result = sqlx::query("INSERT INTO expiry_notifications (crop_id) VALUES (?)")
        .bind(crop_id)
        .execute(pool)
        .await;
    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub async fn has_tombstone(pool: &AnyPool, crop_id: i64) -> MarketResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM expiry_notifications WHERE crop_id = ?")
            .bind(crop_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}
