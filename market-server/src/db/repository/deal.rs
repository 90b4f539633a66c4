//! Deal Repository
//!
//! Buyer want-ads. Mutations carry the owner filter in the WHERE clause so
//! a non-owner's statement matches zero rows instead of failing later.

use crate::core::error::MarketResult;
use rust_decimal::Decimal;
use shared::models::deal::Deal;
use shared::util::now_millis;
use sqlx::Row;
use sqlx::any::AnyRow;
use sqlx::AnyPool;

fn map_deal(row: &AnyRow) -> MarketResult<Deal> {
    Ok(Deal {
        id: row.try_get("id")?,
        buyer_id: row.try_get("buyer_id")?,
        buyer_phone: row.try_get("buyer_phone")?,
        category: row.try_get("category")?,
        crop_name: row.try_get("crop_name")?,
        variety: row.try_get("variety")?,
        quantity_kg: super::get_opt_decimal(row, "quantity_kg")?,
        delivery_date: super::get_opt_date(row, "delivery_date")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
    })
}

const COLS: &str =
    "id, buyer_id, buyer_phone, category, crop_name, variety, quantity_kg, delivery_date, \
     image_path, created_at";

pub struct NewDealRow<'a> {
    pub buyer_id: Option<i64>,
    pub buyer_phone: Option<&'a str>,
    pub category: Option<&'a str>,
    pub crop_name: &'a str,
    pub variety: Option<&'a str>,
    pub quantity_kg: Option<&'a Decimal>,
    pub delivery_date: Option<chrono::NaiveDate>,
    pub image_path: Option<&'a str>,
}

pub async fn insert(pool: &AnyPool, row: NewDealRow<'_>) -> MarketResult<i64> {
    let result = sqlx::query(
        "INSERT INTO deals (buyer_id, buyer_phone, category, crop_name, variety, quantity_kg, \
         delivery_date, image_path, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.buyer_id)
    .bind(row.buyer_phone)
    .bind(row.category)
    .bind(row.crop_name)
    .bind(row.variety)
    .bind(row.quantity_kg.map(super::dec_text))
    .bind(row.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(row.image_path)
    .bind(now_millis())
    .execute(pool)
    .await?;
    super::inserted_id(&result)
}

pub async fn find_by_id(pool: &AnyPool, id: i64) -> MarketResult<Option<Deal>> {
    let sql = format!("SELECT {COLS} FROM deals WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(map_deal).transpose()
}

/// List deals newest-first, optionally narrowed to one buyer.
pub async fn list(pool: &AnyPool, buyer_id: Option<i64>) -> MarketResult<Vec<Deal>> {
    let sql = format!(
        "SELECT {COLS} FROM deals WHERE (? IS NULL OR buyer_id = ?) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(buyer_id)
        .bind(buyer_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(map_deal).collect()
}

/// Owner-guarded update; returns the number of rows the filter matched.
pub async fn update_owned(
    pool: &AnyPool,
    id: i64,
    owner_id: Option<i64>,
    owner_phone: Option<&str>,
    quantity_kg: Option<&Decimal>,
    delivery_date: Option<chrono::NaiveDate>,
) -> MarketResult<u64> {
    let result = sqlx::query(
        "UPDATE deals SET \
         quantity_kg = COALESCE(?, quantity_kg), \
         delivery_date = COALESCE(?, delivery_date) \
         WHERE id = ? AND \
         ((? IS NOT NULL AND buyer_id = ?) OR (? IS NOT NULL AND buyer_phone = ?))",
    )
    .bind(quantity_kg.map(super::dec_text))
    .bind(delivery_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(id)
    .bind(owner_id)
    .bind(owner_id)
    .bind(owner_phone)
    .bind(owner_phone)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Owner-guarded delete.
pub async fn delete_owned(
    pool: &AnyPool,
    id: i64,
    owner_id: Option<i64>,
    owner_phone: Option<&str>,
) -> MarketResult<u64> {
    let result = sqlx::query(
        "DELETE FROM deals WHERE id = ? AND \
         ((? IS NOT NULL AND buyer_id = ?) OR (? IS NOT NULL AND buyer_phone = ?))",
    )
    .bind(id)
    .bind(owner_id)
    .bind(owner_id)
    .bind(owner_phone)
    .bind(owner_phone)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
