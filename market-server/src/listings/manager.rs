//! Crop lifecycle manager

use rust_decimal::Decimal;

use crate::core::error::{MarketError, MarketResult};
use crate::db::repository::crop::{self, NewListingRow};
use crate::db::Storage;
use crate::identity::IdentityResolver;
use crate::media::MediaStore;
use crate::notify::{Locale, Notification, NotificationDispatcher};
use shared::models::crop::{CropListing, CropListingCreate, CropListingUpdate, ListingFilter};
use shared::models::person::Person;
use shared::util::{today, today_iso};

#[derive(Clone)]
pub struct CropLifecycleManager {
    storage: Storage,
    identity: IdentityResolver,
    dispatcher: NotificationDispatcher,
    media: MediaStore,
}

impl CropLifecycleManager {
    pub fn new(
        storage: Storage,
        identity: IdentityResolver,
        dispatcher: NotificationDispatcher,
        media: MediaStore,
    ) -> Self {
        Self {
            storage,
            identity,
            dispatcher,
            media,
        }
    }

    /// Create a listing. The seller reference is resolved from phone when
    /// no id was supplied; a listing born past its expiry date is notified
    /// and tombstoned immediately so the poller never re-fires for it.
    pub async fn create_listing(&self, input: CropListingCreate) -> MarketResult<i64> {
        if input.category.trim().is_empty() {
            return Err(MarketError::Validation("category is required".into()));
        }
        if input.crop_name.trim().is_empty() {
            return Err(MarketError::Validation("crop_name is required".into()));
        }
        if input.quantity_kg < Decimal::ZERO {
            return Err(MarketError::Validation("quantity_kg must not be negative".into()));
        }
        if input.price_per_kg.is_some_and(|p| p < Decimal::ZERO) {
            return Err(MarketError::Validation("price_per_kg must not be negative".into()));
        }

        let seller = self
            .identity
            .farmer_by_id_or_phone(input.seller_id, input.seller_phone.as_deref())
            .await?;
        let seller_id = input.seller_id.or(seller.as_ref().map(|p| p.id));
        let seller_name = input
            .seller_name
            .clone()
            .or_else(|| seller.as_ref().map(|p| p.name.clone()));
        let seller_phone = input
            .seller_phone
            .clone()
            .or_else(|| seller.as_ref().map(|p| p.phone.clone()));

        let image_path = match &input.image {
            Some(bytes) => Some(self.media.store(bytes).await?),
            None => None,
        };

        let id = crop::insert(
            self.storage.pool(),
            NewListingRow {
                seller_id,
                seller_name: seller_name.as_deref(),
                seller_phone: seller_phone.as_deref(),
                category: input.category.trim(),
                crop_name: input.crop_name.trim(),
                variety: input.variety.as_deref(),
                quantity_kg: &input.quantity_kg,
                price_per_kg: input.price_per_kg.as_ref(),
                expiry_date: input.expiry_date,
                image_path: image_path.as_deref(),
            },
        )
        .await?;

        tracing::info!(id, crop = %input.crop_name, seller_id = ?seller_id, "Listing created");

        if input.expiry_date.is_some_and(|d| d < today()) {
            self.notify_expired(&seller, &input.crop_name, input.expiry_date);
            crop::insert_tombstone(self.storage.pool(), id).await?;
        }

        if let Some(person) = &seller {
            self.dispatcher.dispatch(
                person.email.as_deref(),
                Notification::CropUploaded {
                    name: person.name.clone(),
                    crop_name: input.crop_name.trim().to_string(),
                    quantity_kg: input.quantity_kg,
                },
                Locale::parse(person.language.as_deref()),
            );
        }

        Ok(id)
    }

    /// Partial update. Quantity may only decrease; a violating request
    /// leaves the stored row untouched.
    pub async fn update_listing(
        &self,
        id: i64,
        changes: &CropListingUpdate,
    ) -> MarketResult<CropListing> {
        if changes.is_empty() {
            return Err(MarketError::Validation("no fields supplied".into()));
        }
        if changes.price_per_kg.is_some_and(|p| p < Decimal::ZERO) {
            return Err(MarketError::Validation("price_per_kg must not be negative".into()));
        }
        if changes.quantity_kg.is_some_and(|q| q < Decimal::ZERO) {
            return Err(MarketError::Validation("quantity_kg must not be negative".into()));
        }

        let existing = self.get_listing(id).await?;
        if changes.quantity_kg.is_some_and(|q| q > existing.quantity_kg) {
            return Err(MarketError::InvariantViolation(format!(
                "quantity may only decrease ({} -> {})",
                existing.quantity_kg,
                changes.quantity_kg.unwrap_or_default()
            )));
        }

        crop::update_fields(
            self.storage.pool(),
            id,
            changes.price_per_kg.as_ref(),
            changes.seller_phone.as_deref(),
            changes.quantity_kg.as_ref(),
        )
        .await?;

        self.get_listing(id).await
    }

    /// Withdraw a listing. No expiry notice goes out for a withdrawn row.
    pub async fn delete_listing(&self, id: i64) -> MarketResult<()> {
        let existing = self.get_listing(id).await?;
        crop::delete(self.storage.pool(), id).await?;
        if let Some(path) = &existing.image_path {
            self.media.delete(path).await;
        }
        tracing::info!(id, crop = %existing.crop_name, "Listing withdrawn");
        Ok(())
    }

    pub async fn get_listing(&self, id: i64) -> MarketResult<CropListing> {
        crop::find_by_id(self.storage.pool(), id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("listing {id}")))
    }

    pub async fn list_listings(&self, filter: &ListingFilter) -> MarketResult<Vec<CropListing>> {
        crop::list(self.storage.pool(), filter).await
    }

    /// One expiry pass: notify and tombstone every listing past its expiry
    /// date that has no tombstone yet. A failure on one listing is logged
    /// and the pass continues. Returns the number of listings handled.
    pub async fn poll_expired_once(&self) -> MarketResult<usize> {
        let expired = crop::expired_unnotified(self.storage.pool(), &today_iso()).await?;
        let mut handled = 0usize;

        for listing in &expired {
            match self.expire_one(listing).await {
                Ok(()) => handled += 1,
                Err(e) => {
                    tracing::warn!(id = listing.id, error = %e, "Expiry handling failed, continuing pass");
                }
            }
        }

        if handled > 0 {
            tracing::info!(handled, "Expiry pass complete");
        }
        Ok(handled)
    }

    async fn expire_one(&self, listing: &CropListing) -> MarketResult<()> {
        let seller = self
            .identity
            .farmer_by_id_or_phone(listing.seller_id, listing.seller_phone.as_deref())
            .await?;
        self.notify_expired(&seller, &listing.crop_name, listing.expiry_date);

        // The tombstone is written whether or not a mail address was found;
        // exactly-once is about the notice attempt, not delivery.
        if !crop::insert_tombstone(self.storage.pool(), listing.id).await? {
            tracing::debug!(id = listing.id, "Tombstone already present");
        }
        Ok(())
    }

    fn notify_expired(
        &self,
        seller: &Option<Person>,
        crop_name: &str,
        expiry_date: Option<chrono::NaiveDate>,
    ) {
        let Some(person) = seller else {
            tracing::debug!(crop = %crop_name, "No resolvable seller for expiry notice");
            return;
        };
        self.dispatcher.dispatch(
            person.email.as_deref(),
            Notification::CropExpired {
                name: person.name.clone(),
                crop_name: crop_name.to_string(),
                expiry_date,
            },
            Locale::parse(person.language.as_deref()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn listing_input(seller_phone: &str, expiry: Option<chrono::NaiveDate>) -> CropListingCreate {
        CropListingCreate {
            seller_id: None,
            seller_name: None,
            seller_phone: Some(seller_phone.into()),
            category: "vegetable".into(),
            crop_name: "Tomato".into(),
            variety: Some("Roma".into()),
            quantity_kg: dec!(250),
            price_per_kg: Some(dec!(18.50)),
            expiry_date: expiry,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_resolves_seller_from_phone() {
        let env = testutil::TestEnv::new().await;
        let farmer = env.register_farmer("Ravi", "9100000001").await;
        let manager = env.listings();

        let id = manager
            .create_listing(listing_input("9100000001", Some(today() + Duration::days(7))))
            .await
            .unwrap();

        let stored = manager.get_listing(id).await.unwrap();
        assert_eq!(stored.seller_id, Some(farmer));
        assert_eq!(stored.seller_name.as_deref(), Some("Ravi"));
    }

    #[tokio::test]
    async fn create_rejects_blank_and_negative_fields() {
        let env = testutil::TestEnv::new().await;
        let manager = env.listings();

        let mut input = listing_input("9100000002", None);
        input.crop_name = "   ".into();
        assert!(matches!(
            manager.create_listing(input).await.unwrap_err(),
            MarketError::Validation(_)
        ));

        let mut input = listing_input("9100000002", None);
        input.quantity_kg = dec!(-1);
        assert!(matches!(
            manager.create_listing(input).await.unwrap_err(),
            MarketError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn quantity_may_only_decrease() {
        let env = testutil::TestEnv::new().await;
        env.register_farmer("Ravi", "9100000003").await;
        let manager = env.listings();
        let id = manager
            .create_listing(listing_input("9100000003", None))
            .await
            .unwrap();

        let err = manager
            .update_listing(
                id,
                &CropListingUpdate {
                    quantity_kg: Some(dec!(300)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvariantViolation(_)));
        // Stored value unchanged after the rejected update.
        assert_eq!(manager.get_listing(id).await.unwrap().quantity_kg, dec!(250));

        let updated = manager
            .update_listing(
                id,
                &CropListingUpdate {
                    quantity_kg: Some(dec!(200)),
                    price_per_kg: Some(dec!(19)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity_kg, dec!(200));
        assert_eq!(updated.price_per_kg, Some(dec!(19)));
    }

    #[tokio::test]
    async fn update_requires_fields_and_existing_row() {
        let env = testutil::TestEnv::new().await;
        let manager = env.listings();

        assert!(matches!(
            manager
                .update_listing(1, &CropListingUpdate::default())
                .await
                .unwrap_err(),
            MarketError::Validation(_)
        ));
        assert!(matches!(
            manager
                .update_listing(
                    4242,
                    &CropListingUpdate {
                        price_per_kg: Some(dec!(10)),
                        ..Default::default()
                    }
                )
                .await
                .unwrap_err(),
            MarketError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn expiry_pass_notifies_exactly_once() {
        let env = testutil::TestEnv::new().await;
        env.register_farmer("Ravi", "9100000004").await;
        let manager = env.listings();

        // Insert directly with a past date so creation-time tombstoning
        // does not interfere with what the poller sees.
        let id = crop::insert(
            env.storage.pool(),
            NewListingRow {
                seller_id: None,
                seller_name: Some("Ravi"),
                seller_phone: Some("9100000004"),
                category: "vegetable",
                crop_name: "Spinach",
                variety: None,
                quantity_kg: &dec!(40),
                price_per_kg: Some(&dec!(12)),
                expiry_date: Some(today() - Duration::days(2)),
                image_path: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(manager.poll_expired_once().await.unwrap(), 1);
        let sent = env.wait_for_mail(1).await;
        assert!(sent[0].subject.contains("Spinach"));

        // Second and third passes see the tombstone and do nothing.
        assert_eq!(manager.poll_expired_once().await.unwrap(), 0);
        assert_eq!(manager.poll_expired_once().await.unwrap(), 0);
        assert_eq!(env.transport.sent().len(), 1);
        assert!(crop::has_tombstone(env.storage.pool(), id).await.unwrap());
    }

    #[tokio::test]
    async fn past_expiry_on_creation_tombstones_immediately() {
        let env = testutil::TestEnv::new().await;
        env.register_farmer("Ravi", "9100000005").await;
        let manager = env.listings();

        let id = manager
            .create_listing(listing_input("9100000005", Some(today() - Duration::days(1))))
            .await
            .unwrap();

        assert!(crop::has_tombstone(env.storage.pool(), id).await.unwrap());
        // Expired notice + uploaded notice both go to the seller.
        let sent = env.wait_for_mail(2).await;
        assert!(sent.iter().any(|m| m.subject.contains("expired")));

        // The poller has nothing left to do for this listing.
        assert_eq!(manager.poll_expired_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn withdrawn_listing_emits_no_expiry_notice() {
        let env = testutil::TestEnv::new().await;
        env.register_farmer("Ravi", "9100000006").await;
        let manager = env.listings();

        let id = manager
            .create_listing(listing_input("9100000006", Some(today() + Duration::days(3))))
            .await
            .unwrap();
        env.wait_for_mail(1).await; // uploaded notice

        manager.delete_listing(id).await.unwrap();
        assert_eq!(manager.poll_expired_once().await.unwrap(), 0);
        assert_eq!(env.transport.sent().len(), 1);
    }
}
