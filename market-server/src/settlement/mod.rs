//! Settlement Module
//!
//! Money math and the checkout ledger. GST and commission rates depend on
//! the crop's category, classified by keyword from the crop name; the rate
//! table is fixed at compile time. The net payable shown to a farmer is
//! always recomputed from stored ledger rows, never taken from the client.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::error::{MarketError, MarketResult};
use crate::db::repository::{crop, order};
use crate::db::Storage;
use crate::identity::IdentityResolver;
use crate::notify::{Locale, Notification, NotificationDispatcher};
use shared::models::order::{
    CheckoutRequest, CheckoutSummary, PurchaseNotification as PurchaseNotificationRow,
};
use shared::models::person::Role;

/// Settlement category. GST and commission percentages hang off this, not
/// off the free-form category string stored with the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropCategory {
    Masala,
    FreshProduce,
    Staple,
}

/// Produce that settles at the fresh rate even when the listing name never
/// says "fruit" or "vegetable".
const FRESH_PRODUCE_NAMES: &[&str] = &[
    "fruit", "vegetable", "tomato", "onion", "potato", "spinach", "carrot", "cabbage",
    "cauliflower", "brinjal", "okra", "chilli", "apple", "banana", "mango", "grape", "orange",
    "papaya", "guava",
];

impl CropCategory {
    /// Keyword classification over the lowered crop name. Anything not
    /// recognized settles at the staple rate.
    pub fn classify(crop_name: &str) -> CropCategory {
        let name = crop_name.to_lowercase();
        if name.contains("masala") {
            CropCategory::Masala
        } else if FRESH_PRODUCE_NAMES.iter().any(|kw| name.contains(kw)) {
            CropCategory::FreshProduce
        } else {
            CropCategory::Staple
        }
    }

    pub fn gst_percent(&self) -> Decimal {
        match self {
            CropCategory::Masala => Decimal::from(5),
            CropCategory::FreshProduce | CropCategory::Staple => Decimal::ZERO,
        }
    }

    pub fn commission_percent(&self) -> Decimal {
        match self {
            CropCategory::Masala => Decimal::from(15),
            CropCategory::FreshProduce => Decimal::from(12),
            CropCategory::Staple => Decimal::from(8),
        }
    }
}

fn round2(value: Decimal) -> Decimal {
    // Rescale so rendered amounts always carry two decimal places.
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Gross value of one line, rounded to 2 dp.
pub fn line_total(quantity_kg: Decimal, price_per_kg: Decimal) -> Decimal {
    round2(quantity_kg * price_per_kg)
}

/// Net payable to the farmer for `total` after GST and commission.
pub fn net_amount(crop_name: &str, total: Decimal) -> Decimal {
    let category = CropCategory::classify(crop_name);
    let hundred = Decimal::from(100);
    let gst = total * category.gst_percent() / hundred;
    let commission = total * category.commission_percent() / hundred;
    round2(total - gst - commission)
}

#[derive(Clone)]
pub struct SettlementCalculator {
    storage: Storage,
    identity: IdentityResolver,
    dispatcher: NotificationDispatcher,
}

impl SettlementCalculator {
    pub fn new(
        storage: Storage,
        identity: IdentityResolver,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            storage,
            identity,
            dispatcher,
        }
    }

    /// Authoritative net payable for one (invoice, farmer) pair, recomputed
    /// from the stored ledger rows.
    pub async fn invoice_net_total(
        &self,
        invoice_id: &str,
        farmer_id: i64,
    ) -> MarketResult<Decimal> {
        let rows =
            order::orders_for_invoice_farmer(self.storage.pool(), invoice_id, farmer_id).await?;
        Ok(rows
            .iter()
            .map(|row| net_amount(&row.crop_name, row.total))
            .sum())
    }

    /// Record a checkout: one ledger row and one farmer inbox row per line,
    /// then a sale notice per distinct farmer (with the recomputed net) and
    /// one confirmation to the buyer, all fire-and-forget.
    pub async fn record_checkout(&self, req: CheckoutRequest) -> MarketResult<CheckoutSummary> {
        if req.lines.is_empty() {
            return Err(MarketError::Validation("no checkout lines supplied".into()));
        }
        for line in &req.lines {
            if line.quantity_kg <= Decimal::ZERO || line.price_per_kg < Decimal::ZERO {
                return Err(MarketError::Validation(
                    "quantity must be positive and price non-negative".into(),
                ));
            }
        }

        let invoice_id = req
            .invoice_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let payment_method = if req.payment_method.trim().is_empty() {
            "cod"
        } else {
            req.payment_method.trim()
        };

        let mut order_ids = Vec::with_capacity(req.lines.len());
        let mut gross_total = Decimal::ZERO;
        // farmer id -> (crop names, total quantity) for the per-farmer notice.
        let mut per_farmer: HashMap<i64, (Vec<String>, Decimal)> = HashMap::new();

        for line in &req.lines {
            let farmer_id = self.resolve_farmer(line.farmer_id, line.crop_id).await?;
            let total = line_total(line.quantity_kg, line.price_per_kg);
            gross_total += total;

            let order_id = order::insert_order(
                self.storage.pool(),
                order::NewOrderRow {
                    invoice_id: &invoice_id,
                    farmer_id,
                    buyer_id: req.buyer.id,
                    crop_name: &line.crop_name,
                    quantity_kg: &line.quantity_kg,
                    price_per_kg: &line.price_per_kg,
                    total: &total,
                    payment_method,
                },
            )
            .await?;
            order_ids.push(order_id);

            let farmer = self.identity.find_by_id(Role::Farmer, farmer_id).await?;
            order::insert_notification(
                self.storage.pool(),
                order::NewNotificationRow {
                    farmer_id: Some(farmer_id),
                    farmer_phone: farmer.as_ref().map(|p| p.phone.as_str()),
                    crop_id: line.crop_id,
                    crop_name: Some(&line.crop_name),
                    variety: line.variety.as_deref(),
                    quantity_kg: Some(&line.quantity_kg),
                    buyer_name: req.buyer.name.as_deref(),
                    buyer_email: req.buyer.email.as_deref(),
                    buyer_phone: req.buyer.phone.as_deref(),
                },
            )
            .await?;

            let entry = per_farmer
                .entry(farmer_id)
                .or_insert_with(|| (Vec::new(), Decimal::ZERO));
            entry.0.push(line.crop_name.clone());
            entry.1 += line.quantity_kg;
        }

        tracing::info!(
            invoice = %invoice_id,
            lines = order_ids.len(),
            farmers = per_farmer.len(),
            "Checkout recorded"
        );

        let farmers_notified = per_farmer.len();
        for (farmer_id, (crop_names, quantity)) in per_farmer {
            let net = self.invoice_net_total(&invoice_id, farmer_id).await?;
            let Some(farmer) = self.identity.find_by_id(Role::Farmer, farmer_id).await? else {
                continue;
            };
            self.dispatcher.dispatch(
                farmer.email.as_deref(),
                Notification::PurchaseNotification {
                    name: farmer.name.clone(),
                    crop_name: crop_names.join(", "),
                    quantity_kg: quantity,
                    buyer_name: req.buyer.name.clone().unwrap_or_else(|| "a buyer".into()),
                    buyer_phone: req.buyer.phone.clone(),
                    net_amount: net,
                },
                Locale::parse(farmer.language.as_deref()),
            );
        }

        let buyer = match req.buyer.id {
            Some(id) => self.identity.find_by_id(Role::Buyer, id).await?,
            None => None,
        };
        let buyer_email = req
            .buyer
            .email
            .clone()
            .or_else(|| buyer.as_ref().and_then(|p| p.email.clone()));
        let buyer_name = req
            .buyer
            .name
            .clone()
            .or_else(|| buyer.as_ref().map(|p| p.name.clone()))
            .unwrap_or_else(|| "Customer".into());
        self.dispatcher.dispatch(
            buyer_email.as_deref(),
            Notification::PurchaseConfirmation {
                name: buyer_name,
                invoice_id: invoice_id.clone(),
                total: gross_total,
            },
            Locale::parse(buyer.as_ref().and_then(|p| p.language.as_deref())),
        );

        Ok(CheckoutSummary {
            invoice_id,
            order_ids,
            gross_total,
            farmers_notified,
        })
    }

    /// A farmer's inbox over the fan-out rows.
    pub async fn list_purchase_notifications(
        &self,
        farmer_id: Option<i64>,
        farmer_phone: Option<&str>,
        unread_only: bool,
    ) -> MarketResult<Vec<PurchaseNotificationRow>> {
        if farmer_id.is_none() && farmer_phone.is_none() {
            return Err(MarketError::Validation(
                "listing notifications requires a farmer id or phone".into(),
            ));
        }
        order::notifications_for_farmer(self.storage.pool(), farmer_id, farmer_phone, unread_only)
            .await
    }

    /// Mark inbox rows read — the listed ids, or everything unread when no
    /// ids are given. The farmer filter authorizes both forms.
    pub async fn mark_notifications_read(
        &self,
        ids: &[i64],
        farmer_id: Option<i64>,
        farmer_phone: Option<&str>,
    ) -> MarketResult<u64> {
        if farmer_id.is_none() && farmer_phone.is_none() {
            return Err(MarketError::Validation(
                "marking notifications requires a farmer id or phone".into(),
            ));
        }
        order::mark_notifications_read(self.storage.pool(), ids, farmer_id, farmer_phone).await
    }

    async fn resolve_farmer(
        &self,
        explicit: Option<i64>,
        crop_id: Option<i64>,
    ) -> MarketResult<i64> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        if let Some(crop_id) = crop_id {
            if let Some(listing) = crop::find_by_id(self.storage.pool(), crop_id).await? {
                if let Some(seller_id) = listing.seller_id {
                    return Ok(seller_id);
                }
            }
        }
        Err(MarketError::Validation(
            "checkout line has no resolvable farmer".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use rust_decimal_macros::dec;
    use shared::models::order::{BuyerContact, CheckoutLine};

    #[test]
    fn classification_keywords() {
        assert_eq!(CropCategory::classify("Garam Masala"), CropCategory::Masala);
        assert_eq!(CropCategory::classify("vegetables"), CropCategory::FreshProduce);
        assert_eq!(CropCategory::classify("Dry Fruits"), CropCategory::FreshProduce);
        assert_eq!(CropCategory::classify("Fresh Tomato"), CropCategory::FreshProduce);
        assert_eq!(CropCategory::classify("Wheat"), CropCategory::Staple);
        assert_eq!(CropCategory::classify(""), CropCategory::Staple);
    }

    #[test]
    fn net_amount_rate_table() {
        // 1000 gross: masala 5% GST + 15% commission, fresh produce 12%,
        // everything else 8%.
        assert_eq!(net_amount("Masala Mix", dec!(1000)), dec!(800.00));
        assert_eq!(net_amount("Fresh Tomato", dec!(1000)), dec!(880.00));
        assert_eq!(net_amount("vegetable mix", dec!(1000)), dec!(880.00));
        assert_eq!(net_amount("Rice", dec!(1000)), dec!(920.00));
    }

    #[test]
    fn line_total_rounds_half_up() {
        assert_eq!(line_total(dec!(3), dec!(18.50)), dec!(55.50));
        assert_eq!(line_total(dec!(0.333), dec!(10)), dec!(3.33));
        assert_eq!(line_total(dec!(1.005), dec!(10)), dec!(10.05));
    }

    fn checkout(buyer_id: Option<i64>, lines: Vec<CheckoutLine>) -> CheckoutRequest {
        CheckoutRequest {
            invoice_id: None,
            buyer: BuyerContact {
                id: buyer_id,
                name: Some("Anita".into()),
                email: Some("anita@example.com".into()),
                phone: Some("9400000099".into()),
            },
            payment_method: "upi".into(),
            lines,
        }
    }

    fn line(farmer_id: i64, crop: &str, qty: Decimal, price: Decimal) -> CheckoutLine {
        CheckoutLine {
            crop_id: None,
            farmer_id: Some(farmer_id),
            crop_name: crop.into(),
            variety: None,
            quantity_kg: qty,
            price_per_kg: price,
        }
    }

    #[tokio::test]
    async fn checkout_records_ledger_and_notifies_each_farmer_once() {
        let env = testutil::TestEnv::new().await;
        let ravi = env.register_farmer("Ravi", "9400000001").await;
        let suresh = env.register_farmer("Suresh", "9400000002").await;
        let calc = env.settlement();

        let summary = calc
            .record_checkout(checkout(
                None,
                vec![
                    line(ravi, "rice", dec!(100), dec!(10)),
                    line(ravi, "wheat", dec!(50), dec!(20)),
                    line(suresh, "chat masala", dec!(10), dec!(100)),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(summary.order_ids.len(), 3);
        assert_eq!(summary.farmers_notified, 2);
        assert_eq!(summary.gross_total, dec!(3000.00));

        // Two farmer notices plus one buyer confirmation.
        let sent = env.wait_for_mail(3).await;
        let ravi_mail = sent
            .iter()
            .find(|m| m.to == "9400000001@example.com")
            .unwrap();
        // Ravi's net: (1000 + 1000) staple at 8% = 1840.
        assert!(ravi_mail.body.contains("1840.00"));
        let suresh_mail = sent
            .iter()
            .find(|m| m.to == "9400000002@example.com")
            .unwrap();
        // Suresh's net: 1000 masala at 5% + 15% = 800.
        assert!(suresh_mail.body.contains("800.00"));
        assert!(sent.iter().any(|m| m.to == "anita@example.com"));
    }

    #[tokio::test]
    async fn farmer_resolves_from_listing_when_not_explicit() {
        let env = testutil::TestEnv::new().await;
        let ravi = env.register_farmer("Ravi", "9400000003").await;
        let crop_id = env
            .seed_listing(ravi, "9400000003", "Tomato", dec!(100), dec!(15))
            .await;
        let calc = env.settlement();

        let summary = calc
            .record_checkout(checkout(
                None,
                vec![CheckoutLine {
                    crop_id: Some(crop_id),
                    farmer_id: None,
                    crop_name: "Tomato".into(),
                    variety: None,
                    quantity_kg: dec!(10),
                    price_per_kg: dec!(15),
                }],
            ))
            .await
            .unwrap();
        assert_eq!(summary.farmers_notified, 1);

        // A line with neither farmer nor listing is rejected.
        let err = calc
            .record_checkout(checkout(
                None,
                vec![CheckoutLine {
                    crop_id: None,
                    farmer_id: None,
                    crop_name: "Mystery".into(),
                    variety: None,
                    quantity_kg: dec!(1),
                    price_per_kg: dec!(1),
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
    }

    #[tokio::test]
    async fn inbox_listing_and_mark_read() {
        let env = testutil::TestEnv::new().await;
        let ravi = env.register_farmer("Ravi", "9400000004").await;
        let calc = env.settlement();

        calc.record_checkout(checkout(
            None,
            vec![
                line(ravi, "rice", dec!(10), dec!(10)),
                line(ravi, "wheat", dec!(20), dec!(10)),
            ],
        ))
        .await
        .unwrap();

        let inbox = calc
            .list_purchase_notifications(Some(ravi), None, true)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(inbox.iter().all(|n| !n.is_read));

        // Marking with explicit ids only touches those rows.
        let marked = calc
            .mark_notifications_read(&[inbox[0].id], Some(ravi), None)
            .await
            .unwrap();
        assert_eq!(marked, 1);
        assert_eq!(
            calc.list_purchase_notifications(Some(ravi), None, true)
                .await
                .unwrap()
                .len(),
            1
        );

        // A different farmer filter marks nothing.
        let marked = calc
            .mark_notifications_read(&[], Some(424242), None)
            .await
            .unwrap();
        assert_eq!(marked, 0);

        // Empty id list sweeps the rest.
        let marked = calc
            .mark_notifications_read(&[], Some(ravi), None)
            .await
            .unwrap();
        assert_eq!(marked, 1);
    }

    #[tokio::test]
    async fn invoice_net_total_recomputes_from_storage() {
        let env = testutil::TestEnv::new().await;
        let ravi = env.register_farmer("Ravi", "9400000005").await;
        let calc = env.settlement();

        let summary = calc
            .record_checkout(checkout(None, vec![line(ravi, "rice", dec!(100), dec!(10))]))
            .await
            .unwrap();

        let net = calc
            .invoice_net_total(&summary.invoice_id, ravi)
            .await
            .unwrap();
        assert_eq!(net, dec!(920.00));

        // Unknown pairs sum to zero.
        let net = calc.invoice_net_total("no-such-invoice", ravi).await.unwrap();
        assert_eq!(net, Decimal::ZERO);
    }
}
