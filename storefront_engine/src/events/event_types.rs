use serde::Serialize;

use crate::db_types::{Order, Subscription};

/// Emitted once an order moves to `success`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    /// The subscription entitlements granted or activated for this order
    pub entitlements: Vec<Subscription>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, entitlements: Vec<Subscription>) -> Self {
        Self { order, entitlements }
    }
}

/// Emitted once an order moves to `failed` because the gateway reported a different amount.
#[derive(Debug, Clone, Serialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    /// The amount the gateway reported, exactly as it was sent
    pub reported_amount: String,
}

impl OrderFailedEvent {
    pub fn new(order: Order, reported_amount: String) -> Self {
        Self { order, reported_amount }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderFailed(OrderFailedEvent),
}
