use chrono::Utc;
use futures::future::BoxFuture;
use log::*;
use storefront_engine::events::{EventHandlers, EventHooks, OrderFailedEvent, OrderPaidEvent};

pub const ORDER_LOG_BUFFER_SIZE: usize = 25;

/// Writes an audit trail of settled orders to the `store::orders` log target.
///
/// 1. OrderPaidEvent - The invoice, buyer, amount and every entitlement that was granted, along with how long the
///    buyer took to pay.
/// 2. OrderFailedEvent - The invoice and both amounts, so that support staff can follow up with the buyer.
pub fn create_order_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        log_order_paid(&ev);
        no_op()
    });
    hooks.on_order_failed(|ev| {
        log_order_failed(&ev);
        no_op()
    });
    EventHandlers::new(ORDER_LOG_BUFFER_SIZE, hooks)
}

fn log_order_paid(ev: &OrderPaidEvent) {
    let OrderPaidEvent { order, entitlements } = ev;
    let minutes = (Utc::now() - order.created_at).num_minutes();
    info!(
        target: "store::orders",
        "💰️ Invoice {} paid by {} ({}) after {minutes} min. {}",
        order.invoice_id,
        order.username,
        order.amount,
        order.description
    );
    for subscription in entitlements {
        info!(
            target: "store::orders",
            "🎟️ {} holds subscription #{} to service {} (period {}). Active: {}",
            subscription.email,
            subscription.id,
            subscription.service_id,
            subscription.period_id,
            subscription.is_active
        );
    }
}

fn log_order_failed(ev: &OrderFailedEvent) {
    let OrderFailedEvent { order, reported_amount } = ev;
    warn!(
        target: "store::orders",
        "💸️ Invoice {} for {} was {}, but the gateway reported a payment of {reported_amount}. Contact: {}",
        order.invoice_id,
        order.username,
        order.amount,
        order.email.as_deref().unwrap_or("none")
    );
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
