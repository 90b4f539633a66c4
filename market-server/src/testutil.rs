//! Test fixtures: a throwaway embedded store, a recording mail transport,
//! and pre-wired component constructors.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::cart::CartLedger;
use crate::core::config::{StorageConfig, StorageMode};
use crate::db::repository::{crop, person};
use crate::db::Storage;
use crate::deals::DealManager;
use crate::identity::IdentityResolver;
use crate::listings::CropLifecycleManager;
use crate::media::MediaStore;
use crate::notify::{MailMessage, MemoryTransport, NotificationDispatcher};
use shared::models::person::{RegistrationRequest, Role};
use crate::settlement::SettlementCalculator;

pub(crate) struct TestEnv {
    pub storage: Storage,
    pub transport: MemoryTransport,
    pub dispatcher: NotificationDispatcher,
    pub media: MediaStore,
    _dir: tempfile::TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = StorageConfig {
            mode: StorageMode::Fallback,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            sqlite_path: dir.path().join("test.sqlite3").to_string_lossy().into_owned(),
            timeout: Duration::from_secs(5),
        };
        let storage = Storage::connect(&config).await.expect("open test store");

        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(transport.clone()));
        let media = MediaStore::new(dir.path().join("uploads"));

        Self {
            storage,
            transport,
            dispatcher,
            media,
            _dir: dir,
        }
    }

    pub fn identity(&self) -> IdentityResolver {
        IdentityResolver::new(self.storage.clone(), self.dispatcher.clone())
    }

    pub fn listings(&self) -> CropLifecycleManager {
        CropLifecycleManager::new(
            self.storage.clone(),
            self.identity(),
            self.dispatcher.clone(),
            self.media.clone(),
        )
    }

    pub fn cart(&self) -> CartLedger {
        CartLedger::new(self.storage.clone(), self.identity())
    }

    pub fn deals(&self) -> DealManager {
        DealManager::new(self.storage.clone(), self.dispatcher.clone(), self.media.clone())
    }

    pub fn settlement(&self) -> SettlementCalculator {
        SettlementCalculator::new(self.storage.clone(), self.identity(), self.dispatcher.clone())
    }

    /// Insert a participant directly (no welcome mail), returning the id.
    /// Email is derived from the phone so tests can address assertions.
    pub async fn register_person(&self, role: Role, name: &str, phone: &str) -> i64 {
        person::insert(
            self.storage.pool(),
            &RegistrationRequest {
                role,
                name: name.into(),
                phone: phone.into(),
                email: Some(format!("{phone}@example.com")),
                aadhar: None,
                address: None,
                region: None,
                state: None,
                language: Some("en".into()),
            },
        )
        .await
        .expect("insert test person")
    }

    pub async fn register_farmer(&self, name: &str, phone: &str) -> i64 {
        self.register_person(Role::Farmer, name, phone).await
    }

    pub async fn register_buyer(&self, name: &str, phone: &str) -> i64 {
        self.register_person(Role::Buyer, name, phone).await
    }

    /// Insert a listing row directly, bypassing lifecycle side effects.
    pub async fn seed_listing(
        &self,
        farmer_id: i64,
        phone: &str,
        crop_name: &str,
        quantity_kg: Decimal,
        price_per_kg: Decimal,
    ) -> i64 {
        crop::insert(
            self.storage.pool(),
            crop::NewListingRow {
                seller_id: Some(farmer_id),
                seller_name: None,
                seller_phone: Some(phone),
                category: "vegetable",
                crop_name,
                variety: None,
                quantity_kg: &quantity_kg,
                price_per_kg: Some(&price_per_kg),
                expiry_date: None,
                image_path: None,
            },
        )
        .await
        .expect("insert test listing")
    }

    /// Wait (bounded) for at least `n` dispatched mails; dispatch is
    /// detached, so assertions have to poll.
    pub async fn wait_for_mail(&self, n: usize) -> Vec<MailMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let sent = self.transport.sent();
            if sent.len() >= n {
                return sent;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("expected {n} mail(s), saw {}", sent.len());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
