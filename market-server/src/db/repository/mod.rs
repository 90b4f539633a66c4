//! Repository Module
//!
//! Per-table CRUD as free async functions over the shared pool, in the
//! non-macro sqlx API so the statements run unchanged on both backends.
//! Decimal columns are fixed-point text; the helpers below convert on the
//! way in and out.

pub mod cart;
pub mod crop;
pub mod deal;
pub mod order;
pub mod person;

use crate::core::error::{MarketError, MarketResult};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::any::AnyRow;
use std::str::FromStr;

/// Storage form of a decimal value.
pub(crate) fn dec_text(value: &Decimal) -> String {
    value.normalize().to_string()
}

/// Decode a non-null decimal column.
pub(crate) fn get_decimal(row: &AnyRow, col: &str) -> MarketResult<Decimal> {
    let raw: String = row.try_get(col).map_err(MarketError::from)?;
    Decimal::from_str(raw.trim())
        .map_err(|e| MarketError::Database(format!("bad decimal in column {col}: {e}")))
}

/// Decode a nullable decimal column.
pub(crate) fn get_opt_decimal(row: &AnyRow, col: &str) -> MarketResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(col).map_err(MarketError::from)?;
    match raw {
        Some(s) if !s.trim().is_empty() => Decimal::from_str(s.trim())
            .map(Some)
            .map_err(|e| MarketError::Database(format!("bad decimal in column {col}: {e}"))),
        _ => Ok(None),
    }
}

/// Decode a nullable ISO date column.
pub(crate) fn get_opt_date(row: &AnyRow, col: &str) -> MarketResult<Option<chrono::NaiveDate>> {
    let raw: Option<String> = row.try_get(col).map_err(MarketError::from)?;
    match raw {
        Some(s) if !s.trim().is_empty() => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|e| MarketError::Database(format!("bad date in column {col}: {e}"))),
        _ => Ok(None),
    }
}

/// Id of a freshly inserted row.
pub(crate) fn inserted_id(result: &sqlx::any::AnyQueryResult) -> MarketResult<i64> {
    result
        .last_insert_id()
        .ok_or_else(|| MarketError::Database("backend returned no insert id".into()))
}
