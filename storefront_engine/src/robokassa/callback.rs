use std::str::FromStr;

use log::*;
use rust_decimal::Decimal;
use storefront_common::Secret;

use crate::{
    db_types::{ConversionError, InvoiceId},
    robokassa::{
        signature::{callback_signature_base, md5_hex},
        PassthroughParams,
        SignatureError,
        SHP_ORDER_ID,
        SHP_PREFIX,
        SHP_USERNAME,
    },
};

/// The result notification that the gateway sends (form-encoded or as a query string) once a payment completes.
///
/// Field values are kept exactly as received, since the signature is computed over the raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCallback {
    pub out_sum: String,
    pub inv_id: String,
    pub signature: String,
    pub passthrough: PassthroughParams,
}

impl GatewayCallback {
    /// Collects `OutSum`, `InvId`, `SignatureValue` and every `Shp_` parameter. Other parameters are ignored.
    ///
    /// A missing or blank required field fails immediately.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut out_sum = None;
        let mut inv_id = None;
        let mut signature = None;
        let mut passthrough = PassthroughParams::new();
        for (key, value) in params {
            match key.as_ref() {
                "OutSum" => out_sum = Some(value.into()),
                "InvId" => inv_id = Some(value.into()),
                "SignatureValue" => signature = Some(value.into()),
                k if k.starts_with(SHP_PREFIX) => passthrough.insert(k, value),
                _ => {},
            }
        }
        let required = |value: Option<String>, name: &'static str| {
            value.filter(|v| !v.trim().is_empty()).ok_or(SignatureError::MissingField(name))
        };
        Ok(Self {
            out_sum: required(out_sum, "OutSum")?,
            inv_id: required(inv_id, "InvId")?,
            signature: required(signature, "SignatureValue")?,
            passthrough,
        })
    }

    /// Checks the callback signature against `password2`. The comparison ignores the case of the supplied signature.
    pub fn verify(&self, password2: &Secret<String>) -> Result<(), SignatureError> {
        let base = callback_signature_base(&self.out_sum, &self.inv_id, password2.reveal(), &self.passthrough);
        let expected = md5_hex(&base);
        trace!(
            "🧾️ Checking callback for invoice {} ({}) with password2 {}{}",
            self.inv_id,
            self.out_sum,
            password2.masked(),
            self.passthrough.signature_suffix()
        );
        if expected.eq_ignore_ascii_case(self.signature.trim()) {
            Ok(())
        } else {
            warn!("🧾️ Signature mismatch for invoice {}. Received {}", self.inv_id, self.signature);
            Err(SignatureError::Mismatch(self.inv_id.clone()))
        }
    }

    pub fn invoice_id(&self) -> Result<InvoiceId, ConversionError> {
        self.inv_id.parse()
    }

    /// The internal order id echoed back in `Shp_order_id`, if present and numeric.
    pub fn order_id(&self) -> Option<i64> {
        self.passthrough.get(SHP_ORDER_ID).and_then(|id| id.trim().parse().ok())
    }

    pub fn username(&self) -> Option<&str> {
        self.passthrough.get(SHP_USERNAME)
    }

    pub fn reported_amount(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(self.out_sum.trim())
    }

    /// The plain-text body that tells the gateway the notification was processed.
    pub fn acknowledgement(&self) -> String {
        format!("OK{}", self.inv_id)
    }
}
