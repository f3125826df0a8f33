//! Order lifecycle events.
//!
//! The reconciler publishes an [`OrderPaidEvent`] or an [`OrderFailedEvent`] after each callback it applies. Register
//! handlers with [`EventHooks`], turn them into running [`EventHandlers`], and hand the resulting [`EventProducers`]
//! to the API.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
