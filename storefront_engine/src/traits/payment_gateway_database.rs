use thiserror::Error;

use crate::{
    db_types::{InvoiceId, NewOrder, Order, OrderLineItem, SnapshotError},
    traits::{
        data_objects::{PaymentConfirmation, ReconcileOutcome},
        CatalogError,
        CatalogManagement,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the storefront engine.
///
/// This behaviour includes:
/// * Persisting new orders, together with their line items, atomically.
/// * Applying gateway payment confirmations: status transitions and subscription entitlements.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order, and in a single atomic transaction, stores the order and every one of its line items.
    /// Either everything is stored, or nothing is.
    ///
    /// If the invoice id is already taken, [`PaymentGatewayError::InvoiceIdAlreadyExists`] is returned and nothing
    /// is stored.
    async fn insert_order_with_items(
        &self,
        order: NewOrder,
    ) -> Result<(Order, Vec<OrderLineItem>), PaymentGatewayError>;

    /// Applies a (signature-verified) payment confirmation to its order in a single atomic transaction.
    ///
    /// * The order must exist and carry the confirmation's invoice id.
    /// * Orders that have already left `pending` are returned unchanged, flagged as replayed.
    /// * Otherwise the reported amount is compared with the order amount, subscription entitlements are granted
    ///   according to the requested [`crate::traits::EntitlementOrdering`], and the order moves to `success` or
    ///   `failed`.
    async fn apply_payment_confirmation(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<ReconcileOutcome, PaymentGatewayError>;

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("The order database could not complete the request. {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since invoice id {0} is already in use")]
    InvoiceIdAlreadyExists(InvoiceId),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Order {order_id} belongs to invoice {expected}, not {received}")]
    InvoiceMismatch { order_id: i64, expected: InvoiceId, received: InvoiceId },
    #[error("The requested order change is forbidden.")]
    OrderModificationForbidden,
    #[error("{0}")]
    CorruptSnapshot(#[from] SnapshotError),
    #[error("{0}")]
    CatalogError(#[from] CatalogError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}

/// A backend that can serve the full checkout flow: catalog lookups as well as order persistence.
pub trait StorefrontBackend: PaymentGatewayDatabase + CatalogManagement {}

impl<T: PaymentGatewayDatabase + CatalogManagement> StorefrontBackend for T {}
