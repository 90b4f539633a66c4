//! Order & Purchase Notification Repository
//!
//! Settlement ledger rows and the farmer-facing notification inbox. The
//! inbox row is written per checkout line, regardless of whether an email
//! goes out for it.

use crate::core::error::MarketResult;
use rust_decimal::Decimal;
use shared::models::order::{BuyerOrder, PurchaseNotification};
use shared::util::now_millis;
use sqlx::Row;
use sqlx::any::AnyRow;
use sqlx::AnyPool;

fn map_order(row: &AnyRow) -> MarketResult<BuyerOrder> {
    Ok(BuyerOrder {
        id: row.try_get("id")?,
        invoice_id: row.try_get("invoice_id")?,
        farmer_id: row.try_get("farmer_id")?,
        buyer_id: row.try_get("buyer_id")?,
        crop_name: row.try_get("crop_name")?,
        quantity_kg: super::get_decimal(row, "quantity_kg")?,
        price_per_kg: super::get_decimal(row, "price_per_kg")?,
        total: super::get_decimal(row, "total")?,
        payment_method: row.try_get("payment_method")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_notification(row: &AnyRow) -> MarketResult<PurchaseNotification> {
    let is_read: i64 = row.try_get("is_read")?;
    Ok(PurchaseNotification {
        id: row.try_get("id")?,
        farmer_id: row.try_get("farmer_id")?,
        farmer_phone: row.try_get("farmer_phone")?,
        crop_id: row.try_get("crop_id")?,
        crop_name: row.try_get("crop_name")?,
        variety: row.try_get("variety")?,
        quantity_kg: super::get_opt_decimal(row, "quantity_kg")?,
        buyer_name: row.try_get("buyer_name")?,
        buyer_email: row.try_get("buyer_email")?,
        buyer_phone: row.try_get("buyer_phone")?,
        is_read: is_read != 0,
        created_at: row.try_get("created_at")?,
    })
}

pub struct NewOrderRow<'a> {
    pub invoice_id: &'a str,
    pub farmer_id: i64,
    pub buyer_id: Option<i64>,
    pub crop_name: &'a str,
    pub quantity_kg: &'a Decimal,
    pub price_per_kg: &'a Decimal,
    pub total: &'a Decimal,
    pub payment_method: &'a str,
}

pub async fn insert_order(pool: &AnyPool, row: NewOrderRow<'_>) -> MarketResult<i64> {
    let result = sqlx::query(
        "INSERT INTO buyer_orders (invoice_id, farmer_id, buyer_id, crop_name, quantity_kg, \
         price_per_kg, total, payment_method, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.invoice_id)
    .bind(row.farmer_id)
    .bind(row.buyer_id)
    .bind(row.crop_name)
    .bind(super::dec_text(row.quantity_kg))
    .bind(super::dec_text(row.price_per_kg))
    .bind(super::dec_text(row.total))
    .bind(row.payment_method)
    .bind(now_millis())
    .execute(pool)
    .await?;
    super::inserted_id(&result)
}

/// Ledger rows for one (invoice, farmer) pair, used to recompute the
/// authoritative gross from storage.
pub async fn orders_for_invoice_farmer(
    pool: &AnyPool,
    invoice_id: &str,
    farmer_id: i64,
) -> MarketResult<Vec<BuyerOrder>> {
    let rows = sqlx::query(
        "SELECT id, invoice_id, farmer_id, buyer_id, crop_name, quantity_kg, price_per_kg, \
         total, payment_method, created_at FROM buyer_orders \
         WHERE invoice_id = ? AND farmer_id = ? ORDER BY id",
    )
    .bind(invoice_id)
    .bind(farmer_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(map_order).collect()
}

pub struct NewNotificationRow<'a> {
    pub farmer_id: Option<i64>,
    pub farmer_phone: Option<&'a str>,
    pub crop_id: Option<i64>,
    pub crop_name: Option<&'a str>,
    pub variety: Option<&'a str>,
    pub quantity_kg: Option<&'a Decimal>,
    pub buyer_name: Option<&'a str>,
    pub buyer_email: Option<&'a str>,
    pub buyer_phone: Option<&'a str>,
}

pub async fn insert_notification(pool: &AnyPool, row: NewNotificationRow<'_>) -> MarketResult<i64> {
    let result = sqlx::query(
        "INSERT INTO purchase_notifications (farmer_id, farmer_phone, crop_id, crop_name, \
         variety, quantity_kg, buyer_name, buyer_email, buyer_phone, is_read, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(row.farmer_id)
    .bind(row.farmer_phone)
    .bind(row.crop_id)
    .bind(row.crop_name)
    .bind(row.variety)
    .bind(row.quantity_kg.map(super::dec_text))
    .bind(row.buyer_name)
    .bind(row.buyer_email)
    .bind(row.buyer_phone)
    .bind(now_millis())
    .execute(pool)
    .await?;
    super::inserted_id(&result)
}

/// A farmer's inbox, unread first, newest within each group.
pub async fn notifications_for_farmer(
    pool: &AnyPool,
    farmer_id: Option<i64>,
    farmer_phone: Option<&str>,
    unread_only: bool,
) -> MarketResult<Vec<PurchaseNotification>> {
    let mut sql = String::from(
        "SELECT id, farmer_id, farmer_phone, crop_id, crop_name, variety, quantity_kg, \
         buyer_name, buyer_email, buyer_phone, is_read, created_at \
         FROM purchase_notifications \
         WHERE ((? IS NOT NULL AND farmer_id = ?) OR (? IS NOT NULL AND farmer_phone = ?))",
    );
    if unread_only {
        sql.push_str(" AND is_read = 0");
    }
    sql.push_str(" ORDER BY is_read ASC, created_at DESC, id DESC");

    let rows = sqlx::query(&sql)
        .bind(farmer_id)
        .bind(farmer_id)
        .bind(farmer_phone)
        .bind(farmer_phone)
        .fetch_all(pool)
        .await?;
    rows.iter().map(map_notification).collect()
}

/// Mark inbox rows read: the listed ids when given, otherwise the whole
/// unread inbox. The farmer filter guards both forms.
pub async fn mark_notifications_read(
    pool: &AnyPool,
    ids: &[i64],
    farmer_id: Option<i64>,
    farmer_phone: Option<&str>,
) -> MarketResult<u64> {
    let mut sql = String::from(
        "UPDATE purchase_notifications SET is_read = 1 \
         WHERE is_read = 0 AND \
         ((? IS NOT NULL AND farmer_id = ?) OR (? IS NOT NULL AND farmer_phone = ?))",
    );
    if !ids.is_empty() {
        let placeholders = vec!["?"; ids.len()].join(", ");
        sql.push_str(&format!(" AND id IN ({placeholders})"));
    }

    let mut query = sqlx::query(&sql)
        .bind(farmer_id)
        .bind(farmer_id)
        .bind(farmer_phone)
        .bind(farmer_phone);
    for id in ids {
        query = query.bind(id);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
