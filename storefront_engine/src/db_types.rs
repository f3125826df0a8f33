use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use storefront_common::Money;
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the gateway to report on the payment.
    Pending,
    /// The gateway confirmed a payment for exactly the order amount.
    Success,
    /// The gateway reported a payment that does not match the order amount.
    Failed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Success => write!(f, "success"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl ConversionError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------       InvoiceId       ---------------------------------------------------------
/// The numeric invoice id (`InvId`) that the gateway echoes back in its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct InvoiceId(pub i64);

impl From<i64> for InvoiceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for InvoiceId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| ConversionError(format!("Invalid invoice id: {s}")))
    }
}

impl Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Console {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivationType {
    WithActivation,
    WithoutActivation,
}

impl ActivationType {
    /// The wording used for this activation type on fiscal receipts.
    pub fn receipt_label(&self) -> &'static str {
        match self {
            ActivationType::WithActivation => "С активацией",
            ActivationType::WithoutActivation => "Без активаций",
        }
    }
}

impl Display for ActivationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationType::WithActivation => write!(f, "with_activation"),
            ActivationType::WithoutActivation => write!(f, "without_activation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum Discount {
    /// A percentage of the list price, e.g. `15` for 15% off.
    Percent(Decimal),
    /// A fixed amount off the list price.
    Flat(Money),
}

/// A purchasable (game, console, activation type) combination with its list price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub id: i64,
    pub game_id: i64,
    pub console_id: i64,
    pub activation: ActivationType,
    pub price: Money,
    pub is_active: bool,
    pub discount: Option<Discount>,
}

impl PriceTier {
    /// The list price less any discount, rounded half-up to the nearest kopeck. The result is never negative.
    pub fn discounted_price(&self) -> Money {
        let discounted = match self.discount {
            None => self.price,
            Some(Discount::Flat(amount)) => self.price - amount,
            Some(Discount::Percent(pct)) => {
                let pct = pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                let price = self.price.to_decimal();
                let cut = price * pct / Decimal::ONE_HUNDRED;
                Money::from_decimal(price - cut).unwrap_or_else(|e| {
                    error!("Could not apply a {pct}% discount to price tier {}: {e}. Using the list price", self.id);
                    self.price
                })
            },
        };
        discounted.max(Money::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum SubscriptionLevel {
    Essential,
    Extra,
    Deluxe,
}

impl Display for SubscriptionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionLevel::Essential => write!(f, "Essential"),
            SubscriptionLevel::Extra => write!(f, "Extra"),
            SubscriptionLevel::Deluxe => write!(f, "Deluxe"),
        }
    }
}

impl FromStr for SubscriptionLevel {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Essential" => Ok(Self::Essential),
            "Extra" => Ok(Self::Extra),
            "Deluxe" => Ok(Self::Deluxe),
            s => Err(ConversionError(format!("Invalid subscription level: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SubscriptionService {
    pub id: i64,
    pub title: String,
    /// Set for services that are sold in levels. Buyers must then pick one of the [`SubscriptionLevel`]s.
    pub level: Option<SubscriptionLevel>,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SubscriptionPeriod {
    pub id: i64,
    pub service_id: i64,
    pub months: i64,
    pub price: Money,
}

//--------------------------------------     Subscription      ---------------------------------------------------------
/// A buyer's entitlement to a subscription service, keyed by contact email.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub service_id: i64,
    pub period_id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Line items       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Game,
    SubscriptionService,
}

impl Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Game => write!(f, "game"),
            ProductKind::SubscriptionService => write!(f, "subscription_service"),
        }
    }
}

impl FromStr for ProductKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game" => Ok(Self::Game),
            "subscription_service" => Ok(Self::SubscriptionService),
            s => Err(ConversionError(format!("Invalid product kind: {s}"))),
        }
    }
}

/// The catalog entity a line item refers to. Exactly one kind of reference exists per line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductRef {
    Game { game_id: i64, price_tier_id: i64, console_id: i64 },
    SubscriptionService { service_id: i64, period_id: i64, console_id: i64, level: Option<SubscriptionLevel> },
}

impl ProductRef {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductRef::Game { .. } => ProductKind::Game,
            ProductRef::SubscriptionService { .. } => ProductKind::SubscriptionService,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product: ProductRef,
    pub unit_price: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product: ProductRef,
    pub unit_price: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------     CartSnapshot      ---------------------------------------------------------
/// The durable record of what was bought, frozen at checkout time.
///
/// The callback handler replays this snapshot instead of re-reading the (mutable) catalog, so prices and choices
/// made at checkout remain authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items_data: Vec<SnapshotItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub product_type: ProductKind,
    pub product_id: String,
    pub price: Money,
    pub quantity: i64,
    pub extra: SnapshotExtra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotExtra {
    Game {
        price_tier_id: String,
        console_id: String,
        payment_type: ActivationType,
    },
    Subscription {
        subscription_period_id: String,
        console_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_level: Option<String>,
    },
}

/// An entitlement that a paid order grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionGrant {
    pub service_id: i64,
    pub period_id: i64,
}

#[derive(Debug, Clone, Error)]
#[error("Order snapshot is corrupt: {0}")]
pub struct SnapshotError(String);

impl CartSnapshot {
    /// The subscription entitlements that this cart grants, in cart order.
    pub fn subscription_grants(&self) -> Result<Vec<SubscriptionGrant>, SnapshotError> {
        self.items_data
            .iter()
            .filter(|item| item.product_type == ProductKind::SubscriptionService)
            .map(|item| match &item.extra {
                SnapshotExtra::Subscription { subscription_period_id, .. } => Ok(SubscriptionGrant {
                    service_id: parse_id("product_id", &item.product_id)?,
                    period_id: parse_id("subscription_period_id", subscription_period_id)?,
                }),
                SnapshotExtra::Game { .. } => {
                    Err(SnapshotError(format!("subscription item {} carries game details", item.product_id)))
                },
            })
            .collect()
    }
}

fn parse_id(field: &str, value: &str) -> Result<i64, SnapshotError> {
    value.parse::<i64>().map_err(|_| SnapshotError(format!("{field} '{value}' is not a valid id")))
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub invoice_id: InvoiceId,
    pub username: String,
    pub email: Option<String>,
    pub amount: Money,
    pub description: String,
    pub status: OrderStatusType,
    pub snapshot: Json<CartSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Exact numeric comparison of the gateway-reported amount against the locked order amount.
    /// `900`, `900.0` and `900.00` all match an order for 900.00.
    pub fn amount_matches(&self, reported: &Decimal) -> bool {
        self.amount.to_decimal() == *reported
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub invoice_id: InvoiceId,
    pub username: String,
    /// Where receipts are sent, and the key that subscription entitlements are granted against
    pub email: Option<String>,
    /// A short human-readable summary of the cart, shown on the gateway payment page
    pub description: String,
    /// The sum of all line totals, locked at checkout time
    pub amount: Money,
    pub snapshot: CartSnapshot,
    pub items: Vec<NewLineItem>,
}

impl NewOrder {
    /// A copy of this order with a different invoice id. Used when a generated invoice id collides.
    pub fn with_invoice_id(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = invoice_id;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tier(price: i64, discount: Option<Discount>) -> PriceTier {
        PriceTier {
            id: 1,
            game_id: 1,
            console_id: 1,
            activation: ActivationType::WithActivation,
            price: Money::from(price),
            is_active: true,
            discount,
        }
    }

    #[test]
    fn discounted_prices() {
        assert_eq!(tier(90_000, None).discounted_price(), Money::from(90_000));
        let pct = Some(Discount::Percent(Decimal::new(15, 0)));
        assert_eq!(tier(100_000, pct).discounted_price(), Money::from(85_000));
        // 33.3% of 9.99 is 3.32667, leaving 6.66333
        let pct = Some(Discount::Percent(Decimal::new(333, 1)));
        assert_eq!(tier(999, pct).discounted_price(), Money::from(666));
        let flat = Some(Discount::Flat(Money::from(10_000)));
        assert_eq!(tier(90_000, flat).discounted_price(), Money::from(80_000));
        let flat = Some(Discount::Flat(Money::from(100_000)));
        assert_eq!(tier(90_000, flat).discounted_price(), Money::default());
        let pct = Some(Discount::Percent(Decimal::new(150, 0)));
        assert_eq!(tier(90_000, pct).discounted_price(), Money::default());
    }

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [OrderStatusType::Pending, OrderStatusType::Success, OrderStatusType::Failed] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!(!OrderStatusType::Pending.is_terminal());
        assert!(OrderStatusType::Failed.is_terminal());
        assert_eq!(OrderStatusType::from("bogus".to_string()), OrderStatusType::Pending);
    }

    #[test]
    fn snapshot_json_layout() {
        let snapshot = CartSnapshot {
            items_data: vec![
                SnapshotItem {
                    product_type: ProductKind::Game,
                    product_id: "7".into(),
                    price: Money::from(90_000),
                    quantity: 1,
                    extra: SnapshotExtra::Game {
                        price_tier_id: "3".into(),
                        console_id: "2".into(),
                        payment_type: ActivationType::WithActivation,
                    },
                },
                SnapshotItem {
                    product_type: ProductKind::SubscriptionService,
                    product_id: "5".into(),
                    price: Money::from(120_000),
                    quantity: 2,
                    extra: SnapshotExtra::Subscription {
                        subscription_period_id: "9".into(),
                        console_id: "2".into(),
                        selected_level: None,
                    },
                },
            ],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"items_data":[{"product_type":"game","product_id":"7","price":"900.00","quantity":1,"extra":{"price_tier_id":"3","console_id":"2","payment_type":"with_activation"}},{"product_type":"subscription_service","product_id":"5","price":"1200.00","quantity":2,"extra":{"subscription_period_id":"9","console_id":"2"}}]}"#
        );
        let restored: CartSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
        let grants = restored.subscription_grants().unwrap();
        assert_eq!(grants, vec![SubscriptionGrant { service_id: 5, period_id: 9 }]);
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let json = r#"{"items_data":[{"product_type":"subscription_service","product_id":"abc","price":"1.00",
            "quantity":1,"extra":{"subscription_period_id":"9","console_id":"2"}}]}"#;
        let snapshot: CartSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.subscription_grants().is_err());
    }
}
