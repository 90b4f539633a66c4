//! Core infrastructure: configuration, errors, logging, background tasks.

pub mod config;
pub mod error;
pub mod logger;
pub mod tasks;

pub use config::{Config, SmtpSettings, StorageConfig, StorageMode};
pub use error::{MarketError, MarketResult};
