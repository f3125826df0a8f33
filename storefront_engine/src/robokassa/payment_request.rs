use log::*;
use serde::Serialize;
use storefront_common::Money;
use url::Url;

use crate::{
    db_types::{InvoiceId, Order},
    robokassa::{
        signature::{checkout_signature_base, md5_hex},
        PassthroughParams,
        Receipt,
        RobokassaConfig,
        SignatureError,
    },
};

/// A signed request that sends the buyer to the gateway's payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub endpoint: String,
    pub merchant_login: String,
    pub out_sum: Money,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub signature: String,
    pub result_url: String,
    pub success_url: String,
    pub fail_url: String,
    pub is_test: bool,
    pub culture: String,
    /// Only sent when the buyer supplied an email. The receipt goes with it.
    pub email: Option<String>,
    pub receipt_json: String,
    #[serde(skip)]
    pub passthrough: PassthroughParams,
}

impl PaymentRequest {
    /// Builds and signs the payment request for `order`, using the current mode's `password1`.
    pub fn new(
        config: &RobokassaConfig,
        order: &Order,
        receipt: &Receipt,
        passthrough: PassthroughParams,
    ) -> Result<Self, SignatureError> {
        let receipt_json = receipt.to_json().map_err(|e| SignatureError::InvalidReceipt(e.to_string()))?;
        let out_sum = order.amount.to_string();
        let invoice_id = order.invoice_id.to_string();
        let password = config.password1();
        let base = checkout_signature_base(
            &config.merchant_login,
            &out_sum,
            &invoice_id,
            &receipt_json,
            password.reveal(),
            &passthrough,
        );
        let signature = md5_hex(&base);
        debug!(
            "🧾️ Signed invoice {invoice_id} for {out_sum} with password1 {}{}: {signature}",
            password.masked(),
            passthrough.signature_suffix()
        );
        Ok(Self {
            endpoint: config.endpoint.clone(),
            merchant_login: config.merchant_login.clone(),
            out_sum: order.amount,
            invoice_id: order.invoice_id,
            description: order.description.clone(),
            signature,
            result_url: config.result_url.clone(),
            success_url: config.success_url.clone(),
            fail_url: config.fail_url.clone(),
            is_test: config.test_mode,
            culture: config.culture.clone(),
            email: order.email.clone(),
            receipt_json,
            passthrough,
        })
    }

    /// The request parameters in the order the gateway documents them, followed by the passthrough parameters.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("MerchantLogin".to_string(), self.merchant_login.clone()),
            ("OutSum".to_string(), self.out_sum.to_string()),
            ("InvId".to_string(), self.invoice_id.to_string()),
            ("Description".to_string(), self.description.clone()),
            ("SignatureValue".to_string(), self.signature.clone()),
            ("ResultURL".to_string(), self.result_url.clone()),
            ("SuccessURL".to_string(), self.success_url.clone()),
            ("FailURL".to_string(), self.fail_url.clone()),
            ("IsTest".to_string(), if self.is_test { "1" } else { "0" }.to_string()),
            ("Culture".to_string(), self.culture.clone()),
        ];
        if let Some(email) = &self.email {
            pairs.push(("Email".to_string(), email.clone()));
            pairs.push(("Receipt".to_string(), self.receipt_json.clone()));
        }
        pairs.extend(self.passthrough.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        pairs
    }

    /// The URL of the payment page, with every request parameter encoded in the query string.
    pub fn to_url(&self) -> Result<Url, SignatureError> {
        let url = Url::parse_with_params(&self.endpoint, self.query_pairs())
            .map_err(|e| SignatureError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        trace!("🧾️ Payment URL for invoice {} is {} characters long", self.invoice_id, url.as_str().len());
        Ok(url)
    }
}
