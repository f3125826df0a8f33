use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{CartSnapshot, InvoiceId, NewOrder, Order, OrderLineItem, SubscriptionLevel},
    helpers::{InvoiceIdGenerator, InvoiceIdStrategy},
    robokassa::{PassthroughParams, PaymentRequest, Receipt, RobokassaConfig},
    store_api::{
        cart_objects::{cart_total, describe_items, Buyer, CartItem, CheckoutRequest, PricedItem, PurchasedProduct},
        errors::CheckoutError,
        order_objects::{CheckoutResult, OrderSummary},
    },
    traits::{CatalogManagement, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError},
};

/// How many invoice ids are tried before a checkout gives up.
pub const MAX_INVOICE_ATTEMPTS: usize = 5;
/// The largest quantity of a single cart item.
pub const MAX_QUANTITY: i64 = 1_000;

/// `CheckoutApi` turns a cart into a pending order and a signed payment request.
///
/// Checkout happens in three steps, each of which can be called on its own:
/// 1. [`Self::resolve_cart`] checks every cart item against the catalog and prices it.
/// 2. [`Self::create_order`] aggregates the priced items into one pending order, and stores it together with its line
///    items and the cart snapshot in a single transaction.
/// 3. [`Self::payment_request`] signs the request that sends the buyer to the gateway.
///
/// [`Self::checkout`] runs all three.
pub struct CheckoutApi<B> {
    db: B,
    config: RobokassaConfig,
    invoice_ids: Arc<dyn InvoiceIdGenerator>,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.config.merchant_login)
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, config: RobokassaConfig) -> Self {
        let invoice_ids = InvoiceIdStrategy::default().generator();
        Self { db, config, invoice_ids }
    }

    pub fn with_invoice_ids(mut self, invoice_ids: Arc<dyn InvoiceIdGenerator>) -> Self {
        self.invoice_ids = invoice_ids;
        self
    }

    pub fn config(&self) -> &RobokassaConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CheckoutApi<B>
where B: PaymentGatewayDatabase + CatalogManagement
{
    /// Resolves the cart, creates the pending order and signs the payment request for it.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, CheckoutError> {
        let buyer = validate_buyer(request.buyer)?;
        let items = self.resolve_cart(&request.items).await?;
        let (order, line_items) = self.create_order(&buyer, &items).await?;
        let payment_request = self.payment_request(&order, &items)?;
        let payment_url = payment_request.to_url()?.to_string();
        info!(
            "🛒️ Checkout complete for {}. Invoice {} (order #{}) for {} awaits payment.",
            buyer.username, order.invoice_id, order.id, order.amount
        );
        Ok(CheckoutResult { order, line_items, payment_request, payment_url })
    }

    /// Resolves every item in the cart. Items of an unknown product type are skipped. Any other resolution failure
    /// fails the whole cart.
    pub async fn resolve_cart(&self, items: &[CartItem]) -> Result<Vec<PricedItem>, CheckoutError> {
        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            match self.resolve_item(item).await? {
                Some(p) => priced.push(p),
                None => warn!("🛒️ Skipping cart item with an unknown product type"),
            }
        }
        if priced.is_empty() {
            debug!("🛒️ None of the {} cart items could be purchased", items.len());
            return Err(CheckoutError::NoValidItems);
        }
        Ok(priced)
    }

    /// Checks a single cart item against the catalog and prices it. Returns `None` for items of an unknown product
    /// type.
    pub async fn resolve_item(&self, item: &CartItem) -> Result<Option<PricedItem>, CheckoutError> {
        match item {
            CartItem::Game { price_id, quantity } => self.resolve_game(*price_id, *quantity).await.map(Some),
            CartItem::SubscriptionService { service_id, period_id, console_id, level, quantity } => self
                .resolve_subscription(*service_id, *period_id, *console_id, level.as_deref(), *quantity)
                .await
                .map(Some),
            CartItem::Unknown => Ok(None),
        }
    }

    async fn resolve_game(&self, price_id: i64, quantity: i64) -> Result<PricedItem, CheckoutError> {
        check_quantity(quantity)?;
        let tier = self
            .db
            .fetch_price_tier(price_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| CheckoutError::NotFound(format!("Price tier {price_id}")))?;
        let game = self
            .db
            .fetch_game(tier.game_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("Game {}", tier.game_id)))?;
        if !game.is_available {
            return Err(CheckoutError::Unavailable(format!("Game '{}'", game.title)));
        }
        let console = self
            .db
            .fetch_console(tier.console_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("Console {}", tier.console_id)))?;
        let unit_price = tier.discounted_price();
        trace!("🛒️ Price tier {price_id} resolves to '{}' on {} at {unit_price}", game.title, console.name);
        Ok(PricedItem { product: PurchasedProduct::Game { game, tier, console }, unit_price, quantity })
    }

    async fn resolve_subscription(
        &self,
        service_id: i64,
        period_id: i64,
        console_id: i64,
        level: Option<&str>,
        quantity: i64,
    ) -> Result<PricedItem, CheckoutError> {
        check_quantity(quantity)?;
        let service = self
            .db
            .fetch_subscription_service(service_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("Subscription service {service_id}")))?;
        if !service.is_available {
            return Err(CheckoutError::Unavailable(format!("Subscription service '{}'", service.title)));
        }
        let period = self
            .db
            .fetch_subscription_period(period_id)
            .await?
            .filter(|p| p.service_id == service.id)
            .ok_or_else(|| {
                CheckoutError::NotFound(format!("Period {period_id} of subscription service {service_id}"))
            })?;
        let console = self
            .db
            .fetch_console(console_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("Console {console_id}")))?;
        let level = match service.level {
            Some(_) => Some(parse_level(&service.title, level)?),
            None => None,
        };
        let unit_price = period.price;
        trace!("🛒️ '{}' for {} months on {} resolves to {unit_price}", service.title, period.months, console.name);
        let product = PurchasedProduct::Subscription { service, period, console, level };
        Ok(PricedItem { product, unit_price, quantity })
    }

    /// Stores the priced items as a single pending order.
    ///
    /// The order amount is the sum of the line totals at this moment, and does not change if catalog prices change
    /// later. If the generated invoice id is already in use, a fresh one is tried, up to [`MAX_INVOICE_ATTEMPTS`]
    /// times.
    pub async fn create_order(
        &self,
        buyer: &Buyer,
        items: &[PricedItem],
    ) -> Result<(Order, Vec<OrderLineItem>), CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::NoValidItems);
        }
        let amount = cart_total(items).ok_or_else(|| {
            warn!("🛒️ The cart total for {} does not fit in an order amount", buyer.username);
            CheckoutError::ValidationError("The cart total is too large".into())
        })?;
        let snapshot = CartSnapshot { items_data: items.iter().map(PricedItem::to_snapshot_item).collect() };
        let order = NewOrder {
            invoice_id: self.invoice_ids.next_invoice_id(),
            username: buyer.username.clone(),
            email: buyer.email.clone(),
            description: describe_items(items),
            amount,
            snapshot,
            items: items.iter().map(PricedItem::to_line_item).collect(),
        };
        let mut attempt = 1;
        let mut order = order;
        loop {
            match self.db.insert_order_with_items(order.clone()).await {
                Ok(saved) => return Ok(saved),
                Err(PaymentGatewayError::InvoiceIdAlreadyExists(id)) if attempt < MAX_INVOICE_ATTEMPTS => {
                    warn!(
                        "🛒️ Invoice id {id} is already taken. Retrying with a new one \
                         ({attempt}/{MAX_INVOICE_ATTEMPTS})"
                    );
                    attempt += 1;
                    order = order.with_invoice_id(self.invoice_ids.next_invoice_id());
                },
                Err(PaymentGatewayError::InvoiceIdAlreadyExists(id)) => {
                    error!(
                        "🛒️ No free invoice id after {MAX_INVOICE_ATTEMPTS} attempts. The last one tried was {id}"
                    );
                    return Err(CheckoutError::Internal("Could not allocate an invoice id".into()));
                },
                Err(e) => {
                    error!("🛒️ Could not save order for {}: {e}", buyer.username);
                    return Err(e.into());
                },
            }
        }
    }

    /// Signs the gateway payment request for an order created from `items`.
    pub fn payment_request(&self, order: &Order, items: &[PricedItem]) -> Result<PaymentRequest, CheckoutError> {
        let receipt = Receipt::for_items(items)?;
        if receipt.total() != order.amount {
            error!(
                "🛒️ Receipt total {} does not match the amount of order #{}: {}",
                receipt.total(),
                order.id,
                order.amount
            );
            return Err(CheckoutError::Internal("Receipt does not match the order".into()));
        }
        let passthrough = PassthroughParams::for_order(order.id, &order.username);
        let request = PaymentRequest::new(&self.config, order, &receipt, passthrough)?;
        Ok(request)
    }

    /// The public view of the order with the given invoice id, if there is one.
    pub async fn order_summary(&self, invoice_id: InvoiceId) -> Result<Option<OrderSummary>, CheckoutError> {
        let order = self.db.fetch_order_by_invoice_id(invoice_id).await?;
        Ok(order.map(OrderSummary::from))
    }
}

fn check_quantity(quantity: i64) -> Result<(), CheckoutError> {
    if quantity < 1 {
        return Err(CheckoutError::ValidationError(format!("Quantity must be at least 1, got {quantity}")));
    }
    if quantity > MAX_QUANTITY {
        return Err(CheckoutError::ValidationError(format!(
            "Quantity must be at most {MAX_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

fn parse_level(service: &str, level: Option<&str>) -> Result<SubscriptionLevel, CheckoutError> {
    let requested = level.unwrap_or_default();
    requested
        .parse::<SubscriptionLevel>()
        .map_err(|_| CheckoutError::InvalidLevel { service: service.to_string(), requested: requested.to_string() })
}

fn validate_buyer(buyer: Buyer) -> Result<Buyer, CheckoutError> {
    let username = buyer.username.trim();
    if username.is_empty() {
        return Err(CheckoutError::ValidationError("A username is required".into()));
    }
    let email = buyer.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(CheckoutError::ValidationError(format!("'{email}' is not an email address")));
        }
    }
    Ok(Buyer { username: username.to_string(), email })
}
