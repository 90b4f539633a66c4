//! Cart Module
//!
//! One ledger implementation serving both cart tables; `CartKind` in the
//! owner picks which. The owner filter on every mutation is the whole of
//! the authorization story: a filter that matches no rows mutates nothing,
//! and the caller learns `NotAuthorized` rather than touching someone
//! else's line.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::error::{MarketError, MarketResult};
use crate::db::repository::{cart, crop};
use crate::db::Storage;
use crate::identity::IdentityResolver;
use shared::models::cart::{
    CartAddOutcome, CartItemInput, CartKind, CartLine, CartLineUpdate, CartOwner,
};
use shared::models::person::Role;

#[derive(Clone)]
pub struct CartLedger {
    storage: Storage,
    identity: IdentityResolver,
}

impl CartLedger {
    pub fn new(storage: Storage, identity: IdentityResolver) -> Self {
        Self { storage, identity }
    }

    /// Add items to the owner's ledger. A line already present for the same
    /// `(owner, crop_id)` is not inserted again; its id comes back with
    /// `note = "duplicate_skipped"`.
    pub async fn add(
        &self,
        owner: &CartOwner,
        items: &[CartItemInput],
    ) -> MarketResult<Vec<CartAddOutcome>> {
        if items.is_empty() {
            return Err(MarketError::Validation("no items supplied".into()));
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity_kg <= Decimal::ZERO {
                return Err(MarketError::Validation(
                    "quantity_kg must be positive".into(),
                ));
            }

            let listing = match item.crop_id {
                Some(crop_id) => crop::find_by_id(self.storage.pool(), crop_id).await?,
                None => None,
            };

            let stored_owner = CartOwner {
                kind: owner.kind,
                id: self.resolve_owner_id(owner, listing.as_ref()).await?,
                phone: owner.phone.clone(),
            };
            if !stored_owner.has_identity() {
                return Err(MarketError::Validation(
                    "cart owner could not be resolved".into(),
                ));
            }

            // Duplicate suppression keys on the crop reference.
            if let Some(crop_id) = item.crop_id {
                if let Some(existing) =
                    cart::find_owned_by_crop(self.storage.pool(), &stored_owner, crop_id).await?
                {
                    outcomes.push(CartAddOutcome {
                        id: existing.id,
                        crop_id: existing.crop_id,
                        crop_name: existing.crop_name,
                        note: Some("duplicate_skipped".into()),
                    });
                    continue;
                }
            }

            let crop_name = item
                .crop_name
                .clone()
                .or_else(|| listing.as_ref().map(|l| l.crop_name.clone()));
            let variety = item
                .variety
                .clone()
                .or_else(|| listing.as_ref().and_then(|l| l.variety.clone()));
            let price_per_kg = item
                .price_per_kg
                .or_else(|| listing.as_ref().and_then(|l| l.price_per_kg));
            let image_path = item
                .image_path
                .clone()
                .or_else(|| listing.as_ref().and_then(|l| l.image_path.clone()));
            let total_price = price_per_kg.map(|p| round2(item.quantity_kg * p));

            let id = cart::insert(
                self.storage.pool(),
                &stored_owner,
                cart::NewCartRow {
                    crop_id: item.crop_id,
                    crop_name: crop_name.as_deref(),
                    variety: variety.as_deref(),
                    quantity_kg: &item.quantity_kg,
                    price_per_kg: price_per_kg.as_ref(),
                    total_price: total_price.as_ref(),
                    image_path: image_path.as_deref(),
                },
            )
            .await?;

            outcomes.push(CartAddOutcome {
                id,
                crop_id: item.crop_id,
                crop_name,
                note: None,
            });
        }

        tracing::debug!(kind = %owner.kind.as_str(), added = outcomes.len(), "Cart add complete");
        Ok(outcomes)
    }

    /// Lines visible under `filter`, newest first. Without an id or phone
    /// the whole ledger of that kind is returned (reads are not
    /// authorization-gated; mutations are).
    pub async fn list(&self, filter: &CartOwner) -> MarketResult<Vec<CartLine>> {
        if filter.has_identity() {
            cart::list_owned(self.storage.pool(), filter).await
        } else {
            cart::list_all(self.storage.pool(), filter.kind).await
        }
    }

    /// Merge `changes` into an owned line and recompute its total.
    pub async fn update(
        &self,
        line_id: i64,
        changes: &CartLineUpdate,
        owner: &CartOwner,
    ) -> MarketResult<CartLine> {
        if changes.is_empty() {
            return Err(MarketError::Validation("no fields supplied".into()));
        }
        if changes.quantity_kg.is_some_and(|q| q <= Decimal::ZERO) {
            return Err(MarketError::Validation(
                "quantity_kg must be positive".into(),
            ));
        }
        if changes.price_per_kg.is_some_and(|p| p < Decimal::ZERO) {
            return Err(MarketError::Validation(
                "price_per_kg must not be negative".into(),
            ));
        }

        let existing = cart::find_by_id(self.storage.pool(), owner.kind, line_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("cart line {line_id}")))?;

        let quantity = changes.quantity_kg.unwrap_or(existing.quantity_kg);
        let price = changes.price_per_kg.or(existing.price_per_kg);
        let total = price.map(|p| round2(quantity * p));

        let touched = cart::update_owned(
            self.storage.pool(),
            owner,
            line_id,
            &quantity,
            price.as_ref(),
            total.as_ref(),
        )
        .await?;
        if touched == 0 {
            return Err(MarketError::NotAuthorized(format!(
                "cart line {line_id} is not owned by the caller"
            )));
        }

        cart::find_by_id(self.storage.pool(), owner.kind, line_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("cart line {line_id}")))
    }

    /// Remove the given owned lines; returns how many rows went away.
    pub async fn remove(&self, line_ids: &[i64], owner: &CartOwner) -> MarketResult<u64> {
        let mut removed = 0u64;
        for &id in line_ids {
            removed += cart::delete_owned(self.storage.pool(), owner, id).await?;
        }
        tracing::debug!(kind = %owner.kind.as_str(), removed, "Cart lines removed");
        Ok(removed)
    }

    /// Empty the owner's ledger. An owner with neither id nor phone would
    /// match nothing; that is rejected up front rather than silently
    /// clearing zero rows.
    pub async fn clear(&self, owner: &CartOwner) -> MarketResult<u64> {
        if !owner.has_identity() {
            return Err(MarketError::Validation(
                "clearing a cart requires an owner id or phone".into(),
            ));
        }
        cart::clear_owned(self.storage.pool(), owner).await
    }

    /// The owner id written on new lines: an explicit id verified against
    /// the role's table, else the listing's seller (farmer carts), else a
    /// phone lookup.
    async fn resolve_owner_id(
        &self,
        owner: &CartOwner,
        listing: Option<&shared::models::crop::CropListing>,
    ) -> MarketResult<Option<i64>> {
        let role = match owner.kind {
            CartKind::Farmer => Role::Farmer,
            CartKind::Buyer => Role::Buyer,
        };

        if let Some(id) = owner.id {
            if self.identity.find_by_id(role, id).await?.is_some() {
                return Ok(Some(id));
            }
            tracing::warn!(id, role = %role.as_str(), "Claimed cart owner id does not exist");
        }

        if owner.kind == CartKind::Farmer {
            if let Some(seller_id) = listing.and_then(|l| l.seller_id) {
                return Ok(Some(seller_id));
            }
        }

        if let Some(phone) = &owner.phone {
            if let Some(found) =
                crate::db::repository::person::find_by_phone(self.storage.pool(), role, phone)
                    .await?
            {
                return Ok(Some(found.id));
            }
        }

        Ok(None)
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use rust_decimal_macros::dec;

    fn item(crop_id: Option<i64>, qty: Decimal, price: Option<Decimal>) -> CartItemInput {
        CartItemInput {
            crop_id,
            crop_name: Some("Tomato".into()),
            variety: None,
            quantity_kg: qty,
            price_per_kg: price,
            image_path: None,
        }
    }

    fn owner(kind: CartKind, id: Option<i64>, phone: Option<&str>) -> CartOwner {
        CartOwner {
            kind,
            id,
            phone: phone.map(String::from),
        }
    }

    #[tokio::test]
    async fn add_computes_total_and_suppresses_duplicates() {
        let env = testutil::TestEnv::new().await;
        let farmer = env.register_farmer("Ravi", "9200000001").await;
        let crop_id = env.seed_listing(farmer, "9200000001", "Tomato", dec!(100), dec!(18.50)).await;
        let ledger = env.cart();
        let ravi = owner(CartKind::Farmer, Some(farmer), None);

        let first = ledger
            .add(&ravi, &[item(Some(crop_id), dec!(3), None)])
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].note.is_none());

        let lines = ledger.list(&ravi).await.unwrap();
        assert_eq!(lines.len(), 1);
        // Price inherited from the listing, total = 3 × 18.50.
        assert_eq!(lines[0].price_per_kg, Some(dec!(18.50)));
        assert_eq!(lines[0].total_price, Some(dec!(55.50)));

        let second = ledger
            .add(&ravi, &[item(Some(crop_id), dec!(5), None)])
            .await
            .unwrap();
        assert_eq!(second[0].note.as_deref(), Some("duplicate_skipped"));
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(ledger.list(&ravi).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ledgers_are_disjoint() {
        let env = testutil::TestEnv::new().await;
        let farmer = env.register_farmer("Ravi", "9200000002").await;
        let buyer = env.register_buyer("Anita", "9200000003").await;
        let ledger = env.cart();

        ledger
            .add(
                &owner(CartKind::Farmer, Some(farmer), None),
                &[item(None, dec!(2), Some(dec!(10)))],
            )
            .await
            .unwrap();
        ledger
            .add(
                &owner(CartKind::Buyer, Some(buyer), None),
                &[item(None, dec!(7), Some(dec!(10)))],
            )
            .await
            .unwrap();

        let farmer_lines = ledger
            .list(&owner(CartKind::Farmer, Some(farmer), None))
            .await
            .unwrap();
        let buyer_lines = ledger
            .list(&owner(CartKind::Buyer, Some(buyer), None))
            .await
            .unwrap();
        assert_eq!(farmer_lines.len(), 1);
        assert_eq!(buyer_lines.len(), 1);
        assert_eq!(farmer_lines[0].quantity_kg, dec!(2));
        assert_eq!(buyer_lines[0].quantity_kg, dec!(7));
    }

    #[tokio::test]
    async fn update_recomputes_total_and_enforces_ownership() {
        let env = testutil::TestEnv::new().await;
        let ravi_id = env.register_farmer("Ravi", "9200000004").await;
        let other_id = env.register_farmer("Suresh", "9200000005").await;
        let ledger = env.cart();
        let ravi = owner(CartKind::Farmer, Some(ravi_id), None);

        let added = ledger
            .add(&ravi, &[item(None, dec!(4), Some(dec!(25)))])
            .await
            .unwrap();
        let line_id = added[0].id;

        // A different farmer touches zero rows.
        let err = ledger
            .update(
                line_id,
                &CartLineUpdate {
                    quantity_kg: Some(dec!(1)),
                    ..Default::default()
                },
                &owner(CartKind::Farmer, Some(other_id), None),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotAuthorized(_)));

        // An absent id is NotFound, not NotAuthorized.
        let err = ledger
            .update(
                999_999,
                &CartLineUpdate {
                    quantity_kg: Some(dec!(1)),
                    ..Default::default()
                },
                &ravi,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));

        let updated = ledger
            .update(
                line_id,
                &CartLineUpdate {
                    quantity_kg: Some(dec!(6)),
                    ..Default::default()
                },
                &ravi,
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity_kg, dec!(6));
        assert_eq!(updated.total_price, Some(dec!(150)));
    }

    #[tokio::test]
    async fn remove_and_clear_respect_the_owner_filter() {
        let env = testutil::TestEnv::new().await;
        let ravi_id = env.register_farmer("Ravi", "9200000006").await;
        let other_id = env.register_farmer("Suresh", "9200000007").await;
        let ledger = env.cart();
        let ravi = owner(CartKind::Farmer, Some(ravi_id), None);

        let added = ledger
            .add(
                &ravi,
                &[
                    item(None, dec!(1), Some(dec!(5))),
                    item(None, dec!(2), Some(dec!(5))),
                ],
            )
            .await
            .unwrap();

        // Another owner removes nothing.
        let removed = ledger
            .remove(
                &[added[0].id],
                &owner(CartKind::Farmer, Some(other_id), None),
            )
            .await
            .unwrap();
        assert_eq!(removed, 0);

        assert_eq!(ledger.remove(&[added[0].id], &ravi).await.unwrap(), 1);

        // Clearing with no identity at all is a validation error.
        let err = ledger
            .clear(&owner(CartKind::Farmer, None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));

        assert_eq!(ledger.clear(&ravi).await.unwrap(), 1);
        assert!(ledger.list(&ravi).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn phone_identifies_the_owner_when_id_is_absent() {
        let env = testutil::TestEnv::new().await;
        env.register_buyer("Anita", "9200000008").await;
        let ledger = env.cart();
        let anita = owner(CartKind::Buyer, None, Some("9200000008"));

        ledger
            .add(&anita, &[item(None, dec!(3), Some(dec!(9)))])
            .await
            .unwrap();

        let lines = ledger.list(&anita).await.unwrap();
        assert_eq!(lines.len(), 1);
        // The row carries the resolved id, not just the phone.
        assert!(lines[0].owner_id.is_some());
    }
}
