use thiserror::Error;

use crate::{
    db_types::InvoiceId,
    robokassa::SignatureError,
    traits::{CatalogError, PaymentGatewayError},
};

/// Reasons a cart cannot be turned into a pending order.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} is not available for purchase")]
    Unavailable(String),
    #[error("'{requested}' is not a valid level for {service}")]
    InvalidLevel { service: String, requested: String },
    #[error("The cart does not contain any purchasable items")]
    NoValidItems,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for CheckoutError {
    fn from(e: CatalogError) -> Self {
        CheckoutError::Internal(e.to_string())
    }
}

impl From<PaymentGatewayError> for CheckoutError {
    fn from(e: PaymentGatewayError) -> Self {
        CheckoutError::Internal(e.to_string())
    }
}

impl From<SignatureError> for CheckoutError {
    fn from(e: SignatureError) -> Self {
        CheckoutError::Internal(e.to_string())
    }
}

/// Reasons a gateway result callback is rejected.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("Callback authentication failed. {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("Invalid callback: {0}")]
    ValidationError(String),
    #[error("{0}")]
    OrderNotFound(String),
    #[error("Invoice {invoice_id} is for {expected}, but the gateway reported {reported}")]
    AmountMismatch { invoice_id: InvoiceId, expected: String, reported: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PaymentGatewayError> for ReconcileError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::OrderIdNotFound(id) => {
                ReconcileError::OrderNotFound(format!("Order {id} does not exist"))
            },
            PaymentGatewayError::InvoiceMismatch { order_id, received, .. } => {
                ReconcileError::OrderNotFound(format!("Order {order_id} does not belong to invoice {received}"))
            },
            e => ReconcileError::Internal(e.to_string()),
        }
    }
}
