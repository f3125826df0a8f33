mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyParseError};
pub use secret::Secret;
