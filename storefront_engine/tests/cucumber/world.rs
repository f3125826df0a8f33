use cucumber::World;
use log::*;
use storefront_common::Secret;
use storefront_engine::{
    db_types::Order,
    events::EventProducers,
    order_objects::CheckoutResult,
    robokassa::{PassthroughParams, RobokassaConfig},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::{seed_catalog, Catalog},
    },
    traits::{EntitlementOrdering, ReconcileOutcome},
    CheckoutApi,
    CheckoutError,
    ReconcileApi,
    ReconcileError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct StoreWorld {
    pub system: Option<StoreSystem>,
    pub checkout: Option<Result<CheckoutResult, CheckoutError>>,
    pub callback: Option<Result<ReconcileOutcome, ReconcileError>>,
}

#[derive(Debug)]
pub struct StoreSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: Catalog,
    pub checkout_api: CheckoutApi<SqliteDatabase>,
    pub reconcile_api: ReconcileApi<SqliteDatabase>,
}

pub fn test_config() -> RobokassaConfig {
    RobokassaConfig {
        merchant_login: "M".into(),
        test_password1: Secret::new("P1".to_string()),
        test_password2: Secret::new("P2".to_string()),
        result_url: "https://shop.example.com/robokassa/result".into(),
        success_url: "https://shop.example.com/paid".into(),
        fail_url: "https://shop.example.com/failed".into(),
        ..Default::default()
    }
}

impl StoreWorld {
    pub fn system(&self) -> &StoreSystem {
        self.system.as_ref().expect("Storefront not initialised")
    }

    pub fn system_mut(&mut self) -> &mut StoreSystem {
        self.system.as_mut().expect("Storefront not initialised")
    }

    pub fn checkout_result(&self) -> &CheckoutResult {
        match self.checkout.as_ref().expect("No checkout has happened") {
            Ok(result) => result,
            Err(e) => panic!("Checkout failed: {e}"),
        }
    }

    /// The order from the last successful checkout
    pub fn order(&self) -> &Order {
        &self.checkout_result().order
    }

    pub fn passthrough(&self) -> &PassthroughParams {
        &self.checkout_result().payment_request.passthrough
    }
}

impl StoreSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        let catalog = seed_catalog(&db).await.expect("Error seeding catalog");
        debug!("Created and seeded database: {url}");
        let checkout_api = CheckoutApi::new(db.clone(), test_config());
        let reconcile_api = ReconcileApi::new(db.clone(), test_config(), EventProducers::default());
        Self { db_path: url, db, catalog, checkout_api, reconcile_api }
    }

    pub fn use_ordering(&mut self, ordering: EntitlementOrdering) {
        self.reconcile_api = ReconcileApi::new(self.db.clone(), test_config(), EventProducers::default())
            .with_ordering(ordering);
    }
}
