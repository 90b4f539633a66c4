//! AgriMarket Server - marketplace consistency engine
//!
//! Backend core for an agricultural marketplace connecting farmers and
//! buyers. HTTP routing, sessions and file-upload mechanics live outside
//! this crate; what lives here is the logic with real invariants:
//!
//! - **Storage** (`db`): one adapter over two relational backends
//!   (networked primary, embedded fallback), selected once at startup
//! - **Identity** (`identity`): person lookup across role-partitioned tables
//! - **Listings** (`listings`): crop lifecycle, expiry detection and
//!   exactly-once expiry notification
//! - **Cart** (`cart`): per-role ledgers with duplicate suppression and
//!   ownership-filtered mutation
//! - **Settlement** (`settlement`): category-dependent tax/commission math
//!   and the checkout ledger
//! - **Notify** (`notify`): fire-and-forget localized mail dispatch
//!
//! # Module structure
//!
//! ```text
//! market-server/src/
//! ├── core/          # config, errors, background tasks
//! ├── db/            # storage adapter, schema, repositories
//! ├── identity/      # cross-role person resolution
//! ├── listings/      # crop lifecycle + expiry scheduler
//! ├── cart/          # cart ledger
//! ├── deals/         # buyer want-ads
//! ├── settlement/    # tax/commission + checkout
//! ├── notify/        # templates, transports, dispatcher
//! └── media.rs       # opaque-path file store
//! ```

pub mod cart;
pub mod core;
pub mod db;
pub mod deals;
pub mod identity;
pub mod listings;
pub mod media;
pub mod notify;
pub mod settlement;

pub use cart::CartLedger;
pub use crate::core::config::{Config, StorageMode};
pub use crate::core::error::{MarketError, MarketResult};
pub use crate::core::tasks::{BackgroundTasks, TaskKind};
pub use db::Storage;
pub use deals::DealManager;
pub use identity::IdentityResolver;
pub use listings::{CropLifecycleManager, ExpiryScheduler};
pub use notify::{Locale, Notification, NotificationDispatcher};
pub use settlement::SettlementCalculator;

#[cfg(test)]
pub(crate) mod testutil;
