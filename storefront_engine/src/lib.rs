//! Storefront Engine
//!
//! The storefront engine turns a shopping cart of games and subscription plans into a signed Robokassa payment
//! request, and later applies the gateway's result notification to the order it belongs to.
//!
//! The library is divided into the following sections:
//! 1. Database management and control ([`mod@sqlite`] and [`mod@traits`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by the engine.
//!    The exception is the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The gateway protocol ([`mod@robokassa`]): the canonical signature strings, receipts, outbound payment requests
//!    and inbound result callbacks.
//! 3. The engine public API ([`mod@store_api`]). [`CheckoutApi`] resolves carts against the catalog and creates
//!    pending orders; [`ReconcileApi`] verifies and applies gateway callbacks.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when an order is paid
//! or when a payment is declined. A simple actor-style channel is used so that you can easily hook into these events
//! and perform custom actions.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod robokassa;
#[cfg(feature = "sqlite")]
pub mod sqlite;
mod store_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use store_api::{
    cart_objects,
    checkout_api::{CheckoutApi, MAX_INVOICE_ATTEMPTS},
    errors::{CheckoutError, ReconcileError},
    order_objects,
    reconcile_api::ReconcileApi,
};
pub use traits::{CatalogManagement, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError, StorefrontBackend};
