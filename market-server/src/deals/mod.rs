//! Deals Module
//!
//! Buyer want-ads. Like cart lines, a deal is only mutable through an
//! owner filter (buyer id or phone); invariants keep the ad honest —
//! wanted quantity only shrinks, the delivery date only moves forward.

use rust_decimal::Decimal;

use crate::core::error::{MarketError, MarketResult};
use crate::db::repository::deal::{self, NewDealRow};
use crate::db::repository::person;
use crate::db::Storage;
use crate::media::MediaStore;
use crate::notify::{Locale, Notification, NotificationDispatcher};
use shared::models::deal::{Deal, DealCreate, DealUpdate};
use shared::models::person::Role;
use shared::util::today;

#[derive(Clone)]
pub struct DealManager {
    storage: Storage,
    dispatcher: NotificationDispatcher,
    media: MediaStore,
}

impl DealManager {
    pub fn new(storage: Storage, dispatcher: NotificationDispatcher, media: MediaStore) -> Self {
        Self {
            storage,
            dispatcher,
            media,
        }
    }

    /// Post a want-ad. The buyer reference is resolved from phone when no
    /// id was supplied; the buyer gets a DealUploaded mail after commit.
    pub async fn create_deal(&self, input: DealCreate) -> MarketResult<i64> {
        if input.crop_name.trim().is_empty() {
            return Err(MarketError::Validation("crop_name is required".into()));
        }
        if input.quantity_kg.is_some_and(|q| q < Decimal::ZERO) {
            return Err(MarketError::Validation(
                "quantity_kg must not be negative".into(),
            ));
        }
        if input.delivery_date.is_some_and(|d| d < today()) {
            return Err(MarketError::InvariantViolation(
                "delivery_date must not be in the past".into(),
            ));
        }

        let buyer = match (input.buyer_id, input.buyer_phone.as_deref()) {
            (Some(id), _) => person::find_by_id(self.storage.pool(), Role::Buyer, id).await?,
            (None, Some(phone)) => {
                person::find_by_phone(self.storage.pool(), Role::Buyer, phone).await?
            }
            (None, None) => None,
        };
        let buyer_id = input.buyer_id.or(buyer.as_ref().map(|p| p.id));
        let buyer_phone = input
            .buyer_phone
            .clone()
            .or_else(|| buyer.as_ref().map(|p| p.phone.clone()));

        let image_path = match &input.image {
            Some(bytes) => Some(self.media.store(bytes).await?),
            None => None,
        };

        let id = deal::insert(
            self.storage.pool(),
            NewDealRow {
                buyer_id,
                buyer_phone: buyer_phone.as_deref(),
                category: input.category.as_deref(),
                crop_name: input.crop_name.trim(),
                variety: input.variety.as_deref(),
                quantity_kg: input.quantity_kg.as_ref(),
                delivery_date: input.delivery_date,
                image_path: image_path.as_deref(),
            },
        )
        .await?;

        tracing::info!(id, crop = %input.crop_name, buyer_id = ?buyer_id, "Deal posted");

        if let Some(person) = &buyer {
            self.dispatcher.dispatch(
                person.email.as_deref(),
                Notification::DealUploaded {
                    name: person.name.clone(),
                    crop_name: input.crop_name.trim().to_string(),
                },
                Locale::parse(person.language.as_deref()),
            );
        }

        Ok(id)
    }

    /// Owner-only partial update. Quantity may only decrease; the delivery
    /// date may only move forward.
    pub async fn update_deal(
        &self,
        id: i64,
        changes: &DealUpdate,
        owner_id: Option<i64>,
        owner_phone: Option<&str>,
    ) -> MarketResult<Deal> {
        if changes.is_empty() {
            return Err(MarketError::Validation("no fields supplied".into()));
        }
        if changes.quantity_kg.is_some_and(|q| q < Decimal::ZERO) {
            return Err(MarketError::Validation(
                "quantity_kg must not be negative".into(),
            ));
        }

        let existing = self.get_deal(id).await?;

        if let (Some(new_qty), Some(old_qty)) = (changes.quantity_kg, existing.quantity_kg) {
            if new_qty > old_qty {
                return Err(MarketError::InvariantViolation(format!(
                    "quantity may only decrease ({old_qty} -> {new_qty})"
                )));
            }
        }
        if let (Some(new_date), Some(old_date)) = (changes.delivery_date, existing.delivery_date) {
            if new_date < old_date {
                return Err(MarketError::InvariantViolation(format!(
                    "delivery_date may only move forward ({old_date} -> {new_date})"
                )));
            }
        }

        let touched = deal::update_owned(
            self.storage.pool(),
            id,
            owner_id,
            owner_phone,
            changes.quantity_kg.as_ref(),
            changes.delivery_date,
        )
        .await?;
        if touched == 0 {
            return Err(MarketError::NotAuthorized(format!(
                "deal {id} is not owned by the caller"
            )));
        }

        self.get_deal(id).await
    }

    /// Owner-only removal, including the stored image.
    pub async fn delete_deal(
        &self,
        id: i64,
        owner_id: Option<i64>,
        owner_phone: Option<&str>,
    ) -> MarketResult<()> {
        let existing = self.get_deal(id).await?;

        let touched = deal::delete_owned(self.storage.pool(), id, owner_id, owner_phone).await?;
        if touched == 0 {
            return Err(MarketError::NotAuthorized(format!(
                "deal {id} is not owned by the caller"
            )));
        }

        if let Some(path) = &existing.image_path {
            self.media.delete(path).await;
        }
        tracing::info!(id, crop = %existing.crop_name, "Deal removed");
        Ok(())
    }

    pub async fn get_deal(&self, id: i64) -> MarketResult<Deal> {
        deal::find_by_id(self.storage.pool(), id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("deal {id}")))
    }

    pub async fn list_deals(&self, buyer_id: Option<i64>) -> MarketResult<Vec<Deal>> {
        deal::list(self.storage.pool(), buyer_id).await
    }
}
