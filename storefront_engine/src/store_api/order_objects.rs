use serde::Serialize;
use storefront_common::Money;

use crate::{
    db_types::{InvoiceId, Order, OrderLineItem, OrderStatusType},
    robokassa::PaymentRequest,
};

/// Everything the caller needs once a checkout succeeds.
#[derive(Debug, Clone)]
pub struct CheckoutResult {
    pub order: Order,
    pub line_items: Vec<OrderLineItem>,
    pub payment_request: PaymentRequest,
    /// The gateway payment page, with every request parameter encoded
    pub payment_url: String,
}

impl CheckoutResult {
    pub fn invoice_id(&self) -> InvoiceId {
        self.order.invoice_id
    }
}

/// The public view of an order. The cart snapshot and buyer details are deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub invoice_id: InvoiceId,
    pub status: OrderStatusType,
    pub amount: Money,
    pub description: String,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        let Order { invoice_id, status, amount, description, .. } = order;
        Self { invoice_id, status, amount, description }
    }
}
