//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the storefront engine database *backends*.
//!
//! ## Traits
//! * [`CatalogManagement`] provides read-only access to the product catalog: games, price tiers, consoles and
//!   subscription plans. Catalog writes happen outside the engine.
//! * [`OrderManagement`] provides methods for querying orders, their line items and subscription entitlements.
//! * [`PaymentGatewayDatabase`] defines the highest level of behaviour: atomically persisting new orders and applying
//!   gateway payment confirmations to them.
//! * [`StorefrontBackend`] is implemented by every backend that provides both catalog access and order persistence.
mod catalog_management;
mod data_objects;
mod order_management;
mod payment_gateway_database;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{EntitlementOrdering, PaymentConfirmation, ReconcileOutcome, ReconcileStatus};
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError, StorefrontBackend};
