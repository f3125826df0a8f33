use rust_decimal::Decimal;
use serde::Serialize;

use crate::db_types::{InvoiceId, Order, Subscription};

/// When subscription entitlements are granted relative to the callback amount check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntitlementOrdering {
    /// Check the amount first. Entitlements are granted (created active, or activated) only for a matching payment,
    /// in the same transaction as the status change.
    #[default]
    AfterAmountCheck,
    /// Legacy behaviour. Missing entitlements are created *inactive* and existing ones activated before the amount is
    /// checked, and they are kept even when the amount does not match.
    BeforeAmountCheck,
}

/// A verified gateway report about the payment for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: i64,
    pub invoice_id: InvoiceId,
    pub reported_amount: Decimal,
    pub ordering: EntitlementOrdering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStatus {
    Accepted,
    Declined,
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub order: Order,
    pub status: ReconcileStatus,
    /// True when the order had already left `pending` and nothing was changed.
    pub replayed: bool,
    pub entitlements: Vec<Subscription>,
}

impl ReconcileOutcome {
    pub fn is_accepted(&self) -> bool {
        self.status == ReconcileStatus::Accepted
    }
}
