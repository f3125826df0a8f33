use std::collections::BTreeMap;

use md5::{Digest, Md5};
use thiserror::Error;

/// The namespace tag that marks custom passthrough parameters.
pub const SHP_PREFIX: &str = "Shp_";
pub const SHP_ORDER_ID: &str = "Shp_order_id";
pub const SHP_USERNAME: &str = "Shp_username";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Required field {0} is missing")]
    MissingField(&'static str),
    #[error("Signature for invoice {0} does not match")]
    Mismatch(String),
    #[error("Could not build the receipt: {0}")]
    InvalidReceipt(String),
    #[error("Could not build the payment URL: {0}")]
    InvalidUrl(String),
}

/// Custom `Shp_` parameters, kept sorted by their full key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassthroughParams(BTreeMap<String, String>);

impl PassthroughParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parameters the storefront attaches to every payment: the internal order id and the buyer's username.
    pub fn for_order(order_id: i64, username: &str) -> Self {
        Self::new().with(SHP_ORDER_ID, order_id.to_string()).with(SHP_USERNAME, username)
    }

    /// Adds a parameter. The `Shp_` prefix is added to `key` if it is not already present.
    pub fn with<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.as_ref();
        let key = if key.starts_with(SHP_PREFIX) { key.to_string() } else { format!("{SHP_PREFIX}{key}") };
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `:key=value` suffix appended to every signature base string.
    pub fn signature_suffix(&self) -> String {
        self.iter().map(|(k, v)| format!(":{k}={v}")).collect()
    }
}

pub fn checkout_signature_base(
    merchant_login: &str,
    out_sum: &str,
    invoice_id: &str,
    receipt_json: &str,
    password1: &str,
    params: &PassthroughParams,
) -> String {
    format!("{merchant_login}:{out_sum}:{invoice_id}:{receipt_json}:{password1}{}", params.signature_suffix())
}

pub fn callback_signature_base(out_sum: &str, invoice_id: &str, password2: &str, params: &PassthroughParams) -> String {
    format!("{out_sum}:{invoice_id}:{password2}{}", params.signature_suffix())
}

/// Lowercase hex MD5 digest of `base`.
pub fn md5_hex(base: &str) -> String {
    format!("{:x}", Md5::digest(base.as_bytes()))
}
