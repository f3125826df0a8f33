use serde::{Deserialize, Serialize};
use storefront_common::Money;

use crate::db_types::{
    Console,
    Game,
    NewLineItem,
    PriceTier,
    ProductKind,
    ProductRef,
    SnapshotExtra,
    SnapshotItem,
    SubscriptionLevel,
    SubscriptionPeriod,
    SubscriptionService,
};

/// The longest description the gateway (and the `orders` table) accepts.
pub const MAX_DESCRIPTION_LEN: usize = 255;

fn one() -> i64 {
    1
}

/// A single entry in a shopping cart, as submitted by the storefront client.
///
/// Items are tagged by `product_type`. Entries with any other product type deserialize to [`CartItem::Unknown`] and
/// are skipped during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product_type", rename_all = "snake_case")]
pub enum CartItem {
    Game {
        /// The price tier id, which pins down the game, console and activation type
        price_id: i64,
        #[serde(default = "one")]
        quantity: i64,
    },
    SubscriptionService {
        service_id: i64,
        period_id: i64,
        console_id: i64,
        #[serde(default)]
        level: Option<String>,
        #[serde(default = "one")]
        quantity: i64,
    },
    #[serde(other)]
    Unknown,
}

impl CartItem {
    pub fn game(price_id: i64, quantity: i64) -> Self {
        Self::Game { price_id, quantity }
    }

    pub fn subscription(service_id: i64, period_id: i64, console_id: i64, level: Option<&str>) -> Self {
        Self::SubscriptionService { service_id, period_id, console_id, level: level.map(String::from), quantity: 1 }
    }

    pub fn with_quantity(self, quantity: i64) -> Self {
        match self {
            Self::Game { price_id, .. } => Self::Game { price_id, quantity },
            Self::SubscriptionService { service_id, period_id, console_id, level, .. } => {
                Self::SubscriptionService { service_id, period_id, console_id, level, quantity }
            },
            Self::Unknown => Self::Unknown,
        }
    }
}

/// The buyer identity attached to a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Buyer {
    pub fn new<S: Into<String>>(username: S) -> Self {
        Self { username: username.into(), email: None }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub buyer: Buyer,
    pub items: Vec<CartItem>,
}

/// The catalog entities a resolved cart item refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasedProduct {
    Game { game: Game, tier: PriceTier, console: Console },
    Subscription {
        service: SubscriptionService,
        period: SubscriptionPeriod,
        console: Console,
        level: Option<SubscriptionLevel>,
    },
}

/// A cart item that has been checked against the catalog and priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub product: PurchasedProduct,
    pub unit_price: Money,
    pub quantity: i64,
}

impl PricedItem {
    /// Unit price × quantity, or `None` if the total does not fit in [`Money`].
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub fn kind(&self) -> ProductKind {
        match self.product {
            PurchasedProduct::Game { .. } => ProductKind::Game,
            PurchasedProduct::Subscription { .. } => ProductKind::SubscriptionService,
        }
    }

    /// The short summary of this item used in the order description.
    pub fn summary(&self) -> String {
        match &self.product {
            PurchasedProduct::Game { game, .. } => format!("Игра: {}", game.title),
            PurchasedProduct::Subscription { service, period, console, level } => {
                let level = level.map(|l| l.to_string()).unwrap_or_default();
                let text = format!("Подписка: {} на {} мес. {level} {}", service.title, period.months, console.name);
                text.split_whitespace().collect::<Vec<&str>>().join(" ")
            },
        }
    }

    /// The item name printed on the fiscal receipt.
    pub fn receipt_name(&self) -> String {
        match &self.product {
            PurchasedProduct::Game { game, tier, console } => {
                format!("{}, Консоль={}, {}", game.title, console.name, tier.activation.receipt_label())
            },
            PurchasedProduct::Subscription { service, period, console, level: Some(level) } => {
                let months = period.months;
                format!("{} на {months} мес., Вариант подписки={level}, Консоль={}", service.title, console.name)
            },
            PurchasedProduct::Subscription { service, period, console, level: None } => {
                format!("{} на {} мес., Консоль={}", service.title, period.months, console.name)
            },
        }
    }

    pub fn to_line_item(&self) -> NewLineItem {
        let product = match &self.product {
            PurchasedProduct::Game { game, tier, console } => {
                ProductRef::Game { game_id: game.id, price_tier_id: tier.id, console_id: console.id }
            },
            PurchasedProduct::Subscription { service, period, console, level } => ProductRef::SubscriptionService {
                service_id: service.id,
                period_id: period.id,
                console_id: console.id,
                level: *level,
            },
        };
        NewLineItem { product, unit_price: self.unit_price, quantity: self.quantity }
    }

    pub fn to_snapshot_item(&self) -> SnapshotItem {
        let (product_id, extra) = match &self.product {
            PurchasedProduct::Game { game, tier, console } => (game.id, SnapshotExtra::Game {
                price_tier_id: tier.id.to_string(),
                console_id: console.id.to_string(),
                payment_type: tier.activation,
            }),
            PurchasedProduct::Subscription { service, period, console, level } => {
                (service.id, SnapshotExtra::Subscription {
                    subscription_period_id: period.id.to_string(),
                    console_id: console.id.to_string(),
                    selected_level: level.map(|l| l.to_string()),
                })
            },
        };
        SnapshotItem {
            product_type: self.kind(),
            product_id: product_id.to_string(),
            price: self.unit_price,
            quantity: self.quantity,
            extra,
        }
    }
}

/// The sum of the line totals, or `None` if any line total, or the sum itself, overflows.
pub fn cart_total(items: &[PricedItem]) -> Option<Money> {
    items.iter().try_fold(Money::default(), |total, item| total.checked_add(item.line_total()?))
}

/// Joins the item summaries with `"; "`, keeping within [`MAX_DESCRIPTION_LEN`] characters.
pub fn describe_items(items: &[PricedItem]) -> String {
    let description = items.iter().map(PricedItem::summary).collect::<Vec<String>>().join("; ");
    if description.chars().count() <= MAX_DESCRIPTION_LEN {
        return description;
    }
    let mut truncated = description.chars().take(MAX_DESCRIPTION_LEN - 3).collect::<String>();
    truncated.push_str("...");
    truncated
}
