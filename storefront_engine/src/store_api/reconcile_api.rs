use std::fmt::Debug;

use log::*;

use crate::{
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent},
    robokassa::{GatewayCallback, RobokassaConfig},
    store_api::errors::ReconcileError,
    traits::{EntitlementOrdering, PaymentConfirmation, PaymentGatewayDatabase, ReconcileOutcome, ReconcileStatus},
};

/// `ReconcileApi` applies the gateway's result callbacks to orders.
///
/// A callback is only ever applied once it has been authenticated with `password2`. The order it names must still be
/// pending for anything to change: callbacks for orders that already reached a final status are acknowledged (or
/// declined) again without side effects, so the gateway can safely retry deliveries.
pub struct ReconcileApi<B> {
    db: B,
    config: RobokassaConfig,
    ordering: EntitlementOrdering,
    producers: EventProducers,
}

impl<B> Debug for ReconcileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcileApi ({:?})", self.ordering)
    }
}

impl<B> ReconcileApi<B> {
    pub fn new(db: B, config: RobokassaConfig, producers: EventProducers) -> Self {
        Self { db, config, ordering: EntitlementOrdering::default(), producers }
    }

    /// Selects when subscription entitlements are granted relative to the amount check.
    pub fn with_ordering(mut self, ordering: EntitlementOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn ordering(&self) -> EntitlementOrdering {
        self.ordering
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconcileApi<B>
where B: PaymentGatewayDatabase
{
    /// Verifies and applies a result callback.
    ///
    /// On success, the order has been marked as paid (now or by an earlier delivery of the same callback) and the
    /// caller should acknowledge the callback with [`GatewayCallback::acknowledgement`].
    ///
    /// A callback whose amount differs from the order amount marks the order as failed and returns
    /// [`ReconcileError::AmountMismatch`].
    pub async fn process_callback(&self, callback: &GatewayCallback) -> Result<ReconcileOutcome, ReconcileError> {
        callback.verify(self.config.password2())?;
        let order_id = callback.order_id().ok_or_else(|| {
            warn!("🔄️ Authenticated callback for invoice {} does not name a valid order", callback.inv_id);
            ReconcileError::OrderNotFound(format!("Callback for invoice {} does not name an order", callback.inv_id))
        })?;
        let invoice_id = callback.invoice_id().map_err(|e| ReconcileError::ValidationError(e.to_string()))?;
        let reported_amount = callback.reported_amount().map_err(|e| {
            ReconcileError::ValidationError(format!("OutSum '{}' is not an amount. {e}", callback.out_sum))
        })?;
        debug!("🔄️ Applying callback for invoice {invoice_id} (order #{order_id}) of {reported_amount}");
        let confirmation = PaymentConfirmation { order_id, invoice_id, reported_amount, ordering: self.ordering };
        let outcome = self.db.apply_payment_confirmation(confirmation).await?;
        if outcome.replayed {
            let status = outcome.order.status;
            info!("🔄️ Callback for invoice {invoice_id} replayed. Order #{order_id} is already {status}");
        } else {
            self.notify(&outcome, &callback.out_sum).await;
        }
        match outcome.status {
            ReconcileStatus::Accepted => {
                info!("🔄️ Invoice {invoice_id} paid. {} entitlements granted.", outcome.entitlements.len());
                Ok(outcome)
            },
            ReconcileStatus::Declined => {
                warn!("🔄️ Invoice {invoice_id} declined. The gateway reported {}", callback.out_sum);
                Err(ReconcileError::AmountMismatch {
                    invoice_id,
                    expected: outcome.order.amount.to_string(),
                    reported: callback.out_sum.clone(),
                })
            },
        }
    }

    async fn notify(&self, outcome: &ReconcileOutcome, reported_amount: &str) {
        match outcome.status {
            ReconcileStatus::Accepted => {
                trace!("🔄️ Notifying order paid hook subscribers");
                let event = OrderPaidEvent::new(outcome.order.clone(), outcome.entitlements.clone());
                self.producers.publish_order_paid(event).await;
            },
            ReconcileStatus::Declined => {
                trace!("🔄️ Notifying order failed hook subscribers");
                let event = OrderFailedEvent::new(outcome.order.clone(), reported_amount.to_string());
                self.producers.publish_order_failed(event).await;
            },
        }
    }
}
