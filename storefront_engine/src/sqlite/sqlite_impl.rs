//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{catalog, db_url, new_pool, orders, subscriptions};
use crate::{
    db_types::{
        Console,
        Game,
        InvoiceId,
        NewOrder,
        Order,
        OrderLineItem,
        OrderStatusType,
        PriceTier,
        Subscription,
        SubscriptionGrant,
        SubscriptionPeriod,
        SubscriptionService,
    },
    traits::{
        CatalogError,
        CatalogManagement,
        EntitlementOrdering,
        OrderManagement,
        PaymentConfirmation,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        ReconcileOutcome,
        ReconcileStatus,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order_with_items(
        &self,
        order: NewOrder,
    ) -> Result<(Order, Vec<OrderLineItem>), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let saved = orders::insert_order(&order, &mut tx).await?;
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let line_item = orders::insert_line_item(saved.id, item, &mut tx).await?;
            items.push(line_item);
        }
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} (invoice {}) saved with {} line items for {}",
            saved.id,
            saved.invoice_id,
            items.len(),
            saved.amount
        );
        Ok((saved, items))
    }

    async fn apply_payment_confirmation(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<ReconcileOutcome, PaymentGatewayError> {
        let PaymentConfirmation { order_id, invoice_id, reported_amount, ordering } = confirmation;
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(order_id, &mut tx).await? {
            return Err(PaymentGatewayError::OrderIdNotFound(order_id));
        }
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        if order.invoice_id != invoice_id {
            warn!(
                "🗃️ Callback for invoice {invoice_id} names order #{order_id}, which belongs to invoice {}",
                order.invoice_id
            );
            let expected = order.invoice_id;
            return Err(PaymentGatewayError::InvoiceMismatch { order_id, expected, received: invoice_id });
        }
        if order.status.is_terminal() {
            debug!("🗃️ Order #{order_id} is already {}. Nothing to do.", order.status);
            let status = match order.status {
                OrderStatusType::Success => ReconcileStatus::Accepted,
                _ => ReconcileStatus::Declined,
            };
            return Ok(ReconcileOutcome { order, status, replayed: true, entitlements: vec![] });
        }
        let grants = order.snapshot.0.subscription_grants()?;
        let amount_matches = order.amount_matches(&reported_amount);
        let entitlements = match (ordering, amount_matches) {
            (EntitlementOrdering::BeforeAmountCheck, _) => grant_entitlements(&order, &grants, false, &mut tx).await?,
            (EntitlementOrdering::AfterAmountCheck, true) => grant_entitlements(&order, &grants, true, &mut tx).await?,
            (EntitlementOrdering::AfterAmountCheck, false) => vec![],
        };
        let (new_status, status) = if amount_matches {
            (OrderStatusType::Success, ReconcileStatus::Accepted)
        } else {
            warn!(
                "🗃️ Order #{order_id} is for {}, but the gateway reported {reported_amount}. Marking it as failed.",
                order.amount
            );
            (OrderStatusType::Failed, ReconcileStatus::Declined)
        };
        let order = orders::update_order_status(order.id, new_status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} is now {}. {} entitlements granted.", order.status, entitlements.len());
        Ok(ReconcileOutcome { order, status, replayed: false, entitlements })
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Grants every subscription in `grants` to the order's contact email. Orders without an email cannot carry
/// entitlements and are skipped.
async fn grant_entitlements(
    order: &Order,
    grants: &[SubscriptionGrant],
    active: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, PaymentGatewayError> {
    if grants.is_empty() {
        return Ok(vec![]);
    }
    let Some(email) = order.email.as_deref() else {
        warn!(
            "🗃️ Order #{} contains {} subscriptions but has no contact email. No entitlements can be granted.",
            order.id,
            grants.len()
        );
        return Ok(vec![]);
    };
    let mut result = Vec::with_capacity(grants.len());
    for grant in grants {
        let subscription = subscriptions::grant_subscription(email, *grant, active, conn).await?;
        result.push(subscription);
    }
    Ok(result)
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_invoice_id(&self, invoice_id: InvoiceId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_invoice_id(invoice_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_subscriptions_for_email(&self, email: &str) -> Result<Vec<Subscription>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let subscriptions = subscriptions::fetch_subscriptions_for_email(email, &mut conn).await?;
        Ok(subscriptions)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_price_tier(&self, id: i64) -> Result<Option<PriceTier>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let tier = catalog::fetch_price_tier(id, &mut conn).await?;
        Ok(tier)
    }

    async fn fetch_game(&self, id: i64) -> Result<Option<Game>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let game = catalog::fetch_game(id, &mut conn).await?;
        Ok(game)
    }

    async fn fetch_console(&self, id: i64) -> Result<Option<Console>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let console = catalog::fetch_console(id, &mut conn).await?;
        Ok(console)
    }

    async fn fetch_subscription_service(&self, id: i64) -> Result<Option<SubscriptionService>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let service = catalog::fetch_subscription_service(id, &mut conn).await?;
        Ok(service)
    }

    async fn fetch_subscription_period(&self, id: i64) -> Result<Option<SubscriptionPeriod>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let period = catalog::fetch_subscription_period(id, &mut conn).await?;
        Ok(period)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date with the embedded migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
