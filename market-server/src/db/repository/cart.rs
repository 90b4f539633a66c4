//! Cart Repository
//!
//! Both cart tables share one column layout; `CartKind::table()` picks the
//! table. Every mutation embeds the owner filter so that an id-or-phone
//! mismatch updates nothing. The filter never matches when both identity
//! fields are NULL.

use crate::core::error::MarketResult;
use rust_decimal::Decimal;
use shared::models::cart::{CartKind, CartLine, CartOwner};
use shared::util::now_millis;
use sqlx::Row;
use sqlx::any::AnyRow;
use sqlx::AnyPool;

fn map_line(row: &AnyRow) -> MarketResult<CartLine> {
    Ok(CartLine {
        id: row.try_get("id")?,
        owner_role: row.try_get("owner_role")?,
        owner_id: row.try_get("owner_id")?,
        owner_phone: row.try_get("owner_phone")?,
        crop_id: row.try_get("crop_id")?,
        crop_name: row.try_get("crop_name")?,
        variety: row.try_get("variety")?,
        quantity_kg: super::get_decimal(row, "quantity_kg")?,
        price_per_kg: super::get_opt_decimal(row, "price_per_kg")?,
        total_price: super::get_opt_decimal(row, "total_price")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
    })
}

const COLS: &str = "id, owner_role, owner_id, owner_phone, crop_id, crop_name, variety, \
                    quantity_kg, price_per_kg, total_price, image_path, created_at";

const OWNER_FILTER: &str =
    "((? IS NOT NULL AND owner_id = ?) OR (? IS NOT NULL AND owner_phone = ?))";

pub struct NewCartRow<'a> {
    pub crop_id: Option<i64>,
    pub crop_name: Option<&'a str>,
    pub variety: Option<&'a str>,
    pub quantity_kg: &'a Decimal,
    pub price_per_kg: Option<&'a Decimal>,
    pub total_price: Option<&'a Decimal>,
    pub image_path: Option<&'a str>,
}

pub async fn insert(pool: &AnyPool, owner: &CartOwner, row: NewCartRow<'_>) -> MarketResult<i64> {
    let sql = format!(
        "INSERT INTO {} (owner_role, owner_id, owner_phone, crop_id, crop_name, variety, \
         quantity_kg, price_per_kg, total_price, image_path, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        owner.kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(owner.kind.as_str())
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(row.crop_id)
        .bind(row.crop_name)
        .bind(row.variety)
        .bind(super::dec_text(row.quantity_kg))
        .bind(row.price_per_kg.map(super::dec_text))
        .bind(row.total_price.map(super::dec_text))
        .bind(row.image_path)
        .bind(now_millis())
        .execute(pool)
        .await?;
    super::inserted_id(&result)
}

/// Existing line for (owner, crop), used for duplicate suppression.
pub async fn find_owned_by_crop(
    pool: &AnyPool,
    owner: &CartOwner,
    crop_id: i64,
) -> MarketResult<Option<CartLine>> {
    let sql = format!(
        "SELECT {COLS} FROM {} WHERE crop_id = ? AND {OWNER_FILTER} LIMIT 1",
        owner.kind.table()
    );
    let row = sqlx::query(&sql)
        .bind(crop_id)
        .bind(owner.id)
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(owner.phone.as_deref())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(map_line).transpose()
}

pub async fn find_by_id(pool: &AnyPool, kind: CartKind, id: i64) -> MarketResult<Option<CartLine>> {
    let sql = format!("SELECT {COLS} FROM {} WHERE id = ?", kind.table());
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(map_line).transpose()
}

/// Every line in one ledger, newest-first.
pub async fn list_all(pool: &AnyPool, kind: CartKind) -> MarketResult<Vec<CartLine>> {
    let sql = format!(
        "SELECT {COLS} FROM {} ORDER BY created_at DESC, id DESC",
        kind.table()
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(map_line).collect()
}

/// Owner's lines, newest-first.
pub async fn list_owned(pool: &AnyPool, owner: &CartOwner) -> MarketResult<Vec<CartLine>> {
    let sql = format!(
        "SELECT {COLS} FROM {} WHERE {OWNER_FILTER} ORDER BY created_at DESC, id DESC",
        owner.kind.table()
    );
    let rows = sqlx::query(&sql)
        .bind(owner.id)
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(owner.phone.as_deref())
        .fetch_all(pool)
        .await?;
    rows.iter().map(map_line).collect()
}

/// Owner-guarded line update with the merged values already computed.
pub async fn update_owned(
    pool: &AnyPool,
    owner: &CartOwner,
    id: i64,
    quantity_kg: &Decimal,
    price_per_kg: Option<&Decimal>,
    total_price: Option<&Decimal>,
) -> MarketResult<u64> {
    let sql = format!(
        "UPDATE {} SET quantity_kg = ?, price_per_kg = ?, total_price = ? \
         WHERE id = ? AND {OWNER_FILTER}",
        owner.kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(super::dec_text(quantity_kg))
        .bind(price_per_kg.map(super::dec_text))
        .bind(total_price.map(super::dec_text))
        .bind(id)
        .bind(owner.id)
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(owner.phone.as_deref())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Owner-guarded line removal.
pub async fn delete_owned(pool: &AnyPool, owner: &CartOwner, id: i64) -> MarketResult<u64> {
    let sql = format!(
        "DELETE FROM {} WHERE id = ? AND {OWNER_FILTER}",
        owner.kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(owner.id)
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(owner.phone.as_deref())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Remove every line the owner filter matches.
pub async fn clear_owned(pool: &AnyPool, owner: &CartOwner) -> MarketResult<u64> {
    let sql = format!("DELETE FROM {} WHERE {OWNER_FILTER}", owner.kind.table());
    let result = sqlx::query(&sql)
        .bind(owner.id)
        .bind(owner.id)
        .bind(owner.phone.as_deref())
        .bind(owner.phone.as_deref())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
