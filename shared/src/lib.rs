//! Shared domain types for the AgriMarket backend.
//!
//! Pure data: entity structs, create/update payloads and the enums that
//! partition them (roles, cart kinds, locales live with their owners).
//! No storage or I/O code belongs here.

pub mod models;
pub mod util;

pub use models::cart::{CartAddOutcome, CartItemInput, CartKind, CartLine, CartLineUpdate, CartOwner};
pub use models::crop::{CropListing, CropListingCreate, CropListingUpdate, ListingFilter};
pub use models::deal::{Deal, DealCreate, DealUpdate};
pub use models::order::{
    BuyerContact, BuyerOrder, CheckoutLine, CheckoutRequest, CheckoutSummary,
    PurchaseNotification,
};
pub use models::person::{Person, ProfileUpdate, RegistrationRequest, Role};
