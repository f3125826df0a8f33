//! Reactions to order lifecycle events that live outside the engine.
pub mod order_log;
