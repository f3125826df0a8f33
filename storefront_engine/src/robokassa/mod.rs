//! # Robokassa gateway protocol
//!
//! Robokassa authenticates both directions of the payment flow with an MD5 digest over a colon-joined string. The
//! digest is always sent and compared as lowercase hex.
//!
//! ## Outbound: payment request
//!
//! ```text
//!    {MerchantLogin}:{OutSum}:{InvId}:{Receipt}:{Password1}[:Shp_key=value...]
//! ```
//!
//! ## Inbound: result callback
//!
//! ```text
//!    {OutSum}:{InvId}:{Password2}[:Shp_key=value...]
//! ```
//!
//! where
//!   * `OutSum` is the amount with exactly two decimal places (e.g. `900.00`) on the way out, and whatever the gateway
//!     sent on the way back.
//!   * `Receipt` is the compact JSON fiscal receipt (see [`Receipt`]).
//!   * `Shp_key=value` are the custom passthrough parameters, sorted by key. The gateway echoes them back verbatim
//!     with the callback.
//!
//! Passwords come in pairs: one pair for test mode and one for production, selected by
//! [`RobokassaConfig::test_mode`].
mod callback;
mod config;
mod payment_request;
mod receipt;
mod signature;

pub use callback::GatewayCallback;
pub use config::{RobokassaConfig, DEFAULT_CULTURE, DEFAULT_ENDPOINT};
pub use payment_request::PaymentRequest;
pub use receipt::{Receipt, ReceiptItem};
pub use signature::{
    callback_signature_base,
    checkout_signature_base,
    md5_hex,
    PassthroughParams,
    SignatureError,
    SHP_ORDER_ID,
    SHP_PREFIX,
    SHP_USERNAME,
};
