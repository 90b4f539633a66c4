//! Entity and payload models.

pub mod cart;
pub mod crop;
pub mod deal;
pub mod order;
pub mod person;
