//! Person Repository
//!
//! Row-level access to the three role-partitioned person tables. The table
//! name comes from [`Role::table`], a closed set — never from request input.

use crate::core::error::MarketResult;
use shared::models::person::{Person, ProfileUpdate, RegistrationRequest, Role};
use sqlx::Row;
use sqlx::any::AnyRow;
use sqlx::AnyPool;

fn map_person(row: &AnyRow) -> MarketResult<Person> {
    Ok(Person {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        aadhar: row.try_get("aadhar")?,
        address: row.try_get("address")?,
        region: row.try_get("region")?,
        state: row.try_get("state")?,
        language: row.try_get("language")?,
    })
}

const COLS: &str = "id, name, phone, email, aadhar, address, region, state, language";

pub async fn insert(pool: &AnyPool, req: &RegistrationRequest) -> MarketResult<i64> {
    let sql = format!(
        "INSERT INTO {} (name, phone, email, aadhar, address, region, state, language) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        req.role.table()
    );
    let result = sqlx::query(&sql)
        .bind(&req.name)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.aadhar)
        .bind(&req.address)
        .bind(&req.region)
        .bind(&req.state)
        .bind(&req.language)
        .execute(pool)
        .await?;
    super::inserted_id(&result)
}

pub async fn find_by_id(pool: &AnyPool, role: Role, id: i64) -> MarketResult<Option<Person>> {
    let sql = format!("SELECT {COLS} FROM {} WHERE id = ?", role.table());
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(map_person).transpose()
}

pub async fn find_by_phone(pool: &AnyPool, role: Role, phone: &str) -> MarketResult<Option<Person>> {
    let sql = format!("SELECT {COLS} FROM {} WHERE phone = ? LIMIT 1", role.table());
    let row = sqlx::query(&sql).bind(phone).fetch_optional(pool).await?;
    row.as_ref().map(map_person).transpose()
}

pub async fn find_by_email(pool: &AnyPool, role: Role, email: &str) -> MarketResult<Option<Person>> {
    let sql = format!("SELECT {COLS} FROM {} WHERE email = ? LIMIT 1", role.table());
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(map_person).transpose()
}

/// True when any of the supplied identifiers matches a row in `role`'s
/// table, optionally not counting the row `exclude_id`.
pub async fn identifier_in_use(
    pool: &AnyPool,
    role: Role,
    phone: Option<&str>,
    aadhar: Option<&str>,
    email: Option<&str>,
    exclude_id: Option<i64>,
) -> MarketResult<bool> {
    if phone.is_none() && aadhar.is_none() && email.is_none() {
        return Ok(false);
    }
    let mut sql = format!(
        "SELECT COUNT(*) FROM {} WHERE \
         ((? IS NOT NULL AND phone = ?) \
          OR (? IS NOT NULL AND aadhar = ?) \
          OR (? IS NOT NULL AND email = ?))",
        role.table()
    );
    if exclude_id.is_some() {
        sql.push_str(" AND id <> ?");
    }
    let mut query = sqlx::query_scalar::<_, i64>(&sql)
        .bind(phone)
        .bind(phone)
        .bind(aadhar)
        .bind(aadhar)
        .bind(email)
        .bind(email);
    if let Some(id) = exclude_id {
        query = query.bind(id);
    }
    let count = query.fetch_one(pool).await?;
    Ok(count > 0)
}

/// Partial profile update; only supplied fields change.
pub async fn update(
    pool: &AnyPool,
    role: Role,
    id: i64,
    changes: &ProfileUpdate,
) -> MarketResult<u64> {
    let sql = format!(
        "UPDATE {} SET \
         name = COALESCE(?, name), \
         phone = COALESCE(?, phone), \
         email = COALESCE(?, email), \
         aadhar = COALESCE(?, aadhar), \
         address = COALESCE(?, address), \
         region = COALESCE(?, region), \
         state = COALESCE(?, state), \
         language = COALESCE(?, language) \
         WHERE id = ?",
        role.table()
    );
    let result = sqlx::query(&sql)
        .bind(&changes.name)
        .bind(&changes.phone)
        .bind(&changes.email)
        .bind(&changes.aadhar)
        .bind(&changes.address)
        .bind(&changes.region)
        .bind(&changes.state)
        .bind(&changes.language)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
