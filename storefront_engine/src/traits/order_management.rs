use crate::{
    db_types::{InvoiceId, Order, OrderLineItem, Subscription},
    traits::PaymentGatewayError,
};

/// The `OrderManagement` trait provides methods for querying orders and the entitlements they have granted.
///
/// The [`crate::traits::PaymentGatewayDatabase`] trait handles the state changes. `OrderManagement` only reads.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given internal id. If no order exists, `None` is returned.
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the order carrying the given gateway invoice id.
    async fn fetch_order_by_invoice_id(&self, invoice_id: InvoiceId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the line items of the given order, in the order they were added to the cart.
    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, PaymentGatewayError>;

    async fn fetch_subscriptions_for_email(&self, email: &str) -> Result<Vec<Subscription>, PaymentGatewayError>;
}
