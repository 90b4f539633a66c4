//! Listings Module
//!
//! Crop listing lifecycle: creation, constrained mutation, withdrawal and
//! expiry. Expiry is observed by a periodic poller; the tombstone table
//! keeps the "your crop expired" notice at-most-once per listing no matter
//! how often the poller runs.

mod expiry;
mod manager;

pub use expiry::ExpiryScheduler;
pub use manager::CropLifecycleManager;
