use std::env;

use log::*;
use storefront_common::{helpers::parse_boolean_flag, Secret};

pub const DEFAULT_ENDPOINT: &str = "https://auth.robokassa.ru/Merchant/Index.aspx";
pub const DEFAULT_CULTURE: &str = "ru";

#[derive(Clone, Debug)]
pub struct RobokassaConfig {
    /// The shop identifier (`MerchantLogin`) issued by Robokassa
    pub merchant_login: String,
    /// Signs outbound payment requests in production
    pub password1: Secret<String>,
    /// Verifies result callbacks in production
    pub password2: Secret<String>,
    pub test_password1: Secret<String>,
    pub test_password2: Secret<String>,
    /// When true, the test password pair is used and payment requests carry `IsTest=1`.
    pub test_mode: bool,
    pub result_url: String,
    pub success_url: String,
    pub fail_url: String,
    /// The payment page that buyers are redirected to
    pub endpoint: String,
    /// The language of the payment page
    pub culture: String,
}

impl Default for RobokassaConfig {
    fn default() -> Self {
        Self {
            merchant_login: String::default(),
            password1: Secret::default(),
            password2: Secret::default(),
            test_password1: Secret::default(),
            test_password2: Secret::default(),
            test_mode: true,
            result_url: String::default(),
            success_url: String::default(),
            fail_url: String::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            culture: DEFAULT_CULTURE.to_string(),
        }
    }
}

impl RobokassaConfig {
    /// The password that signs payment requests in the current mode.
    pub fn password1(&self) -> &Secret<String> {
        if self.test_mode {
            &self.test_password1
        } else {
            &self.password1
        }
    }

    /// The password that authenticates result callbacks in the current mode.
    pub fn password2(&self) -> &Secret<String> {
        if self.test_mode {
            &self.test_password2
        } else {
            &self.password2
        }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let merchant_login = env::var("STORE_ROBOKASSA_MERCHANT_LOGIN").ok().unwrap_or_else(|| {
            error!("🪛️ STORE_ROBOKASSA_MERCHANT_LOGIN is not set. Please set it to your Robokassa shop identifier.");
            String::default()
        });
        let secret = |name: &str| {
            let value = env::var(name).ok().unwrap_or_else(|| {
                warn!("🪛️ {name} is not set. Payments signed or verified with it will be rejected by the gateway.");
                String::default()
            });
            Secret::new(value)
        };
        let password1 = secret("STORE_ROBOKASSA_PASSWORD1");
        let password2 = secret("STORE_ROBOKASSA_PASSWORD2");
        let test_password1 = secret("STORE_ROBOKASSA_TEST_PASSWORD1");
        let test_password2 = secret("STORE_ROBOKASSA_TEST_PASSWORD2");
        let test_mode = parse_boolean_flag(env::var("STORE_ROBOKASSA_TEST_MODE").ok(), defaults.test_mode);
        let url = |name: &str| {
            env::var(name).ok().unwrap_or_else(|| {
                warn!("🪛️ {name} is not set. The gateway will fall back to the URL in the shop's technical settings.");
                String::default()
            })
        };
        let result_url = url("STORE_ROBOKASSA_RESULT_URL");
        let success_url = url("STORE_ROBOKASSA_SUCCESS_URL");
        let fail_url = url("STORE_ROBOKASSA_FAIL_URL");
        let endpoint = env::var("STORE_ROBOKASSA_ENDPOINT").ok().unwrap_or(defaults.endpoint);
        let culture = env::var("STORE_ROBOKASSA_CULTURE").ok().unwrap_or(defaults.culture);
        let config = Self {
            merchant_login,
            password1,
            password2,
            test_password1,
            test_password2,
            test_mode,
            result_url,
            success_url,
            fail_url,
            endpoint,
            culture,
        };
        info!(
            "🪛️ Robokassa configured for shop '{}' in {} mode. password1: {}, password2: {}",
            config.merchant_login,
            if config.test_mode { "test" } else { "production" },
            config.password1().masked(),
            config.password2().masked()
        );
        config
    }
}
