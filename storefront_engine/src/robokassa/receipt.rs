use serde::{Deserialize, Serialize};
use storefront_common::Money;

use super::SignatureError;
use crate::cart_objects::PricedItem;

/// Taxation system: general ("основная") taxation.
pub const TAX_SYSTEM: &str = "osn";
pub const PAYMENT_METHOD: &str = "full_payment";
pub const PAYMENT_OBJECT: &str = "service";
pub const TAX: &str = "none";

/// The fiscal receipt attached to a payment request. It is part of the outbound signature, so its JSON form must be
/// byte-for-byte identical in the signature base string and in the `Receipt` request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub sno: String,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: i64,
    /// The line total, i.e. unit price × quantity
    pub sum: Money,
    pub payment_method: String,
    pub payment_object: String,
    pub tax: String,
}

impl ReceiptItem {
    pub fn new<S: Into<String>>(name: S, quantity: i64, sum: Money) -> Self {
        Self {
            name: name.into(),
            quantity,
            sum,
            payment_method: PAYMENT_METHOD.to_string(),
            payment_object: PAYMENT_OBJECT.to_string(),
            tax: TAX.to_string(),
        }
    }
}

impl Receipt {
    pub fn for_items(items: &[PricedItem]) -> Result<Self, SignatureError> {
        let items = items
            .iter()
            .map(|item| {
                let sum = item.line_total().ok_or_else(|| {
                    SignatureError::InvalidReceipt(format!("{} × {} overflows", item.quantity, item.unit_price))
                })?;
                Ok(ReceiptItem::new(item.receipt_name(), item.quantity, sum))
            })
            .collect::<Result<Vec<_>, SignatureError>>()?;
        Ok(Self { sno: TAX_SYSTEM.to_string(), items })
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(|item| item.sum).sum()
    }

    /// Compact JSON, with non-ASCII characters written as-is.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
