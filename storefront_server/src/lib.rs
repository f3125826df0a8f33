//! # Storefront server
//! This crate hosts the HTTP surface of the storefront. It is responsible for:
//! * Accepting carts from the storefront client, creating pending orders and handing back signed Robokassa payment
//!   page URLs.
//! * Receiving the gateway's result notifications and acknowledging them once they have been applied.
//! * Answering order status queries.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/checkout`: Creates an order for a cart.
//! * `/api/order/{invoice_id}`: The status of an order.
//! * `/robokassa/result`: The gateway result URL. Both POST (form) and GET (query) notifications are accepted.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
