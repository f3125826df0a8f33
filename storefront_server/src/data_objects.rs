use serde::{Deserialize, Serialize};
use storefront_engine::{db_types::InvoiceId, order_objects::CheckoutResult};

/// What the storefront gets back from `POST /api/checkout`. The buyer is redirected to `payment_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub payment_url: String,
    pub invoice_id: InvoiceId,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self { invoice_id: result.invoice_id(), payment_url: result.payment_url }
    }
}
