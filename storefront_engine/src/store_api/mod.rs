//! # Storefront engine public API
//!
//! Two APIs make up the payment flow:
//!
//! * [`checkout_api`] resolves a cart against the catalog, aggregates it into a pending order, and signs the payment
//!   request that sends the buyer to the gateway.
//! * [`reconcile_api`] authenticates the gateway's result callback and applies it to the order it names.
//!
//! The other submodules hold the request and response types and the error taxonomy.
//!
//! # API usage
//!
//! Both APIs are created by supplying a database backend that implements the backend traits they need.
//!
//! ```rust,ignore
//! use storefront_engine::{CheckoutApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = CheckoutApi::new(db, robokassa_config);
//! let result = api.checkout(request).await?;
//! println!("Send the buyer to {}", result.payment_url);
//! ```

pub mod cart_objects;
pub mod checkout_api;
pub mod errors;
pub mod order_objects;
pub mod reconcile_api;
