//! Static schema
//!
//! The full table set is known at compile time, one DDL list per backend.
//! Decimal quantity/price columns persist as fixed-point text so both
//! backends round-trip `rust_decimal::Decimal` without binary float drift.
//! "Column might not exist" is a migration problem, not a runtime branch.

use crate::core::config::StorageMode;
use crate::core::error::MarketResult;
use sqlx::AnyPool;

/// Apply the backend's schema (idempotent).
pub async fn apply(pool: &AnyPool, mode: StorageMode) -> MarketResult<()> {
    let statements = match mode {
        StorageMode::Primary => PRIMARY_SCHEMA,
        StorageMode::Fallback => FALLBACK_SCHEMA,
    };
    for ddl in statements {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// MySQL DDL.
const PRIMARY_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS person_farmer (
        id BIGINT NOT NULL AUTO_INCREMENT,
        name VARCHAR(255) NOT NULL,
        phone VARCHAR(32) NOT NULL,
        email VARCHAR(255) NULL,
        aadhar VARCHAR(32) NULL,
        address TEXT NULL,
        region VARCHAR(128) NULL,
        state VARCHAR(128) NULL,
        language VARCHAR(8) NULL,
        PRIMARY KEY (id),
        INDEX idx_farmer_phone (phone)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS person_buyer (
        id BIGINT NOT NULL AUTO_INCREMENT,
        name VARCHAR(255) NOT NULL,
        phone VARCHAR(32) NOT NULL,
        email VARCHAR(255) NULL,
        aadhar VARCHAR(32) NULL,
        address TEXT NULL,
        region VARCHAR(128) NULL,
        state VARCHAR(128) NULL,
        language VARCHAR(8) NULL,
        PRIMARY KEY (id),
        INDEX idx_buyer_phone (phone)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS person_admin (
        id BIGINT NOT NULL AUTO_INCREMENT,
        name VARCHAR(255) NOT NULL,
        phone VARCHAR(32) NOT NULL,
        email VARCHAR(255) NULL,
        aadhar VARCHAR(32) NULL,
        address TEXT NULL,
        region VARCHAR(128) NULL,
        state VARCHAR(128) NULL,
        language VARCHAR(8) NULL,
        PRIMARY KEY (id),
        INDEX idx_admin_phone (phone)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS crops (
        id BIGINT NOT NULL AUTO_INCREMENT,
        seller_id BIGINT NULL,
        seller_name VARCHAR(255) NULL,
        seller_phone VARCHAR(32) NULL,
        category VARCHAR(100) NOT NULL,
        crop_name VARCHAR(255) NOT NULL,
        variety VARCHAR(255) NULL,
        quantity_kg VARCHAR(32) NOT NULL,
        price_per_kg VARCHAR(32) NULL,
        expiry_date VARCHAR(10) NULL,
        image_path VARCHAR(255) NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_crops_seller (seller_id),
        INDEX idx_crops_expiry (expiry_date)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS expiry_notifications (
        crop_id BIGINT NOT NULL,
        PRIMARY KEY (crop_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS deals (
        id BIGINT NOT NULL AUTO_INCREMENT,
        buyer_id BIGINT NULL,
        buyer_phone VARCHAR(32) NULL,
        category VARCHAR(100) NULL,
        crop_name VARCHAR(255) NOT NULL,
        variety VARCHAR(255) NULL,
        quantity_kg VARCHAR(32) NULL,
        delivery_date VARCHAR(10) NULL,
        image_path VARCHAR(255) NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_deals_buyer (buyer_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS cart (
        id BIGINT NOT NULL AUTO_INCREMENT,
        owner_role VARCHAR(16) NOT NULL,
        owner_id BIGINT NULL,
        owner_phone VARCHAR(32) NULL,
        crop_id BIGINT NULL,
        crop_name VARCHAR(255) NULL,
        variety VARCHAR(255) NULL,
        quantity_kg VARCHAR(32) NOT NULL,
        price_per_kg VARCHAR(32) NULL,
        total_price VARCHAR(32) NULL,
        image_path VARCHAR(255) NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_cart_owner (owner_id),
        INDEX idx_cart_crop (crop_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS cart_buyer (
        id BIGINT NOT NULL AUTO_INCREMENT,
        owner_role VARCHAR(16) NOT NULL,
        owner_id BIGINT NULL,
        owner_phone VARCHAR(32) NULL,
        crop_id BIGINT NULL,
        crop_name VARCHAR(255) NULL,
        variety VARCHAR(255) NULL,
        quantity_kg VARCHAR(32) NOT NULL,
        price_per_kg VARCHAR(32) NULL,
        total_price VARCHAR(32) NULL,
        image_path VARCHAR(255) NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_cart_buyer_owner (owner_id),
        INDEX idx_cart_buyer_crop (crop_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS purchase_notifications (
        id BIGINT NOT NULL AUTO_INCREMENT,
        farmer_id BIGINT NULL,
        farmer_phone VARCHAR(32) NULL,
        crop_id BIGINT NULL,
        crop_name VARCHAR(255) NULL,
        variety VARCHAR(255) NULL,
        quantity_kg VARCHAR(32) NULL,
        buyer_name VARCHAR(255) NULL,
        buyer_email VARCHAR(255) NULL,
        buyer_phone VARCHAR(32) NULL,
        is_read BIGINT NOT NULL DEFAULT 0,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_pn_farmer (farmer_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS buyer_orders (
        id BIGINT NOT NULL AUTO_INCREMENT,
        invoice_id VARCHAR(64) NOT NULL,
        farmer_id BIGINT NOT NULL,
        buyer_id BIGINT NULL,
        crop_name VARCHAR(255) NOT NULL,
        quantity_kg VARCHAR(32) NOT NULL,
        price_per_kg VARCHAR(32) NOT NULL,
        total VARCHAR(32) NOT NULL,
        payment_method VARCHAR(16) NOT NULL,
        created_at BIGINT NOT NULL,
        PRIMARY KEY (id),
        INDEX idx_orders_invoice (invoice_id),
        INDEX idx_orders_farmer (farmer_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
];

/// SQLite DDL, mirroring the primary schema semantics.
const FALLBACK_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS person_farmer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        aadhar TEXT,
        address TEXT,
        region TEXT,
        state TEXT,
        language TEXT
    )",
    "CREATE TABLE IF NOT EXISTS person_buyer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        aadhar TEXT,
        address TEXT,
        region TEXT,
        state TEXT,
        language TEXT
    )",
    "CREATE TABLE IF NOT EXISTS person_admin (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        aadhar TEXT,
        address TEXT,
        region TEXT,
        state TEXT,
        language TEXT
    )",
    "CREATE TABLE IF NOT EXISTS crops (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        seller_id INTEGER,
        seller_name TEXT,
        seller_phone TEXT,
        category TEXT NOT NULL,
        crop_name TEXT NOT NULL,
        variety TEXT,
        quantity_kg TEXT NOT NULL,
        price_per_kg TEXT,
        expiry_date TEXT,
        image_path TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS expiry_notifications (
        crop_id INTEGER PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS deals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        buyer_id INTEGER,
        buyer_phone TEXT,
        category TEXT,
        crop_name TEXT NOT NULL,
        variety TEXT,
        quantity_kg TEXT,
        delivery_date TEXT,
        image_path TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cart (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_role TEXT NOT NULL,
        owner_id INTEGER,
        owner_phone TEXT,
        crop_id INTEGER,
        crop_name TEXT,
        variety TEXT,
        quantity_kg TEXT NOT NULL,
        price_per_kg TEXT,
        total_price TEXT,
        image_path TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS cart_buyer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_role TEXT NOT NULL,
        owner_id INTEGER,
        owner_phone TEXT,
        crop_id INTEGER,
        crop_name TEXT,
        variety TEXT,
        quantity_kg TEXT NOT NULL,
        price_per_kg TEXT,
        total_price TEXT,
        image_path TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS purchase_notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        farmer_id INTEGER,
        farmer_phone TEXT,
        crop_id INTEGER,
        crop_name TEXT,
        variety TEXT,
        quantity_kg TEXT,
        buyer_name TEXT,
        buyer_email TEXT,
        buyer_phone TEXT,
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS buyer_orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id TEXT NOT NULL,
        farmer_id INTEGER NOT NULL,
        buyer_id INTEGER,
        crop_name TEXT NOT NULL,
        quantity_kg TEXT NOT NULL,
        price_per_kg TEXT NOT NULL,
        total TEXT NOT NULL,
        payment_method TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
];
