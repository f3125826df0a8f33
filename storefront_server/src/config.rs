use std::{env, net::IpAddr};

use log::*;
use storefront_common::helpers::parse_boolean_flag;
use storefront_engine::{helpers::InvoiceIdStrategy, robokassa::RobokassaConfig, traits::EntitlementOrdering};

const DEFAULT_STORE_HOST: &str = "127.0.0.1";
const DEFAULT_STORE_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the `for=` field of the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Gateway credentials and payment page settings
    pub robokassa: RobokassaConfig,
    /// If supplied, requests against /robokassa endpoints will be checked against a whitelist of gateway IP
    /// addresses. To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub robokassa_whitelist: Option<Vec<IpAddr>>,
    pub invoice_id_strategy: InvoiceIdStrategy,
    pub entitlement_ordering: EntitlementOrdering,
    /// Bring the database schema up to date before accepting requests.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_STORE_HOST.to_string(),
            port: DEFAULT_STORE_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            robokassa: RobokassaConfig::default(),
            robokassa_whitelist: None,
            invoice_id_strategy: InvoiceIdStrategy::default(),
            entitlement_ordering: EntitlementOrdering::default(),
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("STORE_HOST").ok().unwrap_or_else(|| DEFAULT_STORE_HOST.into());
        let port = env::var("STORE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for STORE_PORT. {e} Using the default, {DEFAULT_STORE_PORT}, \
                         instead."
                    );
                    DEFAULT_STORE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_STORE_PORT);
        let database_url = env::var("STORE_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ STORE_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("STORE_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("STORE_USE_FORWARDED").ok(), false);
        let robokassa = RobokassaConfig::from_env_or_default();
        let robokassa_whitelist = parse_ip_whitelist(env::var("STORE_ROBOKASSA_IP_WHITELIST").ok());
        log_whitelist(&robokassa_whitelist);
        let invoice_id_strategy = env::var("STORE_INVOICE_ID_STRATEGY")
            .ok()
            .and_then(|s| {
                s.parse::<InvoiceIdStrategy>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for STORE_INVOICE_ID_STRATEGY. {e}"))
                    .ok()
            })
            .unwrap_or_default();
        if invoice_id_strategy == InvoiceIdStrategy::EpochModulo {
            warn!(
                "🪛️ Invoice ids are derived from the clock. Collisions are retried, but bursts of checkouts in the \
                 same second will be slower."
            );
        }
        let entitlement_ordering = if parse_boolean_flag(env::var("STORE_LEGACY_ENTITLEMENT_ORDER").ok(), false) {
            warn!(
                "🪛️ STORE_LEGACY_ENTITLEMENT_ORDER is set. Subscriptions are granted before the paid amount is checked \
                 and are kept when it does not match."
            );
            EntitlementOrdering::BeforeAmountCheck
        } else {
            EntitlementOrdering::AfterAmountCheck
        };
        let run_migrations = parse_boolean_flag(env::var("STORE_RUN_MIGRATIONS").ok(), true);
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            robokassa,
            robokassa_whitelist,
            invoice_id_strategy,
            entitlement_ordering,
            run_migrations,
        }
    }
}

/// Parses a comma-separated list of IP addresses. Invalid entries are skipped with a warning.
///
/// `None` means that no whitelist is in force, which is also what "none", "false" and "0" ask for.
pub fn parse_ip_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let value = value?;
    if ["none", "false", "0"].contains(&value.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Robokassa IP whitelist is disabled. If this is not what you want, set STORE_ROBOKASSA_IP_WHITELIST to \
             a comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in STORE_ROBOKASSA_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect();
    Some(ip_addrs)
}

fn log_whitelist(whitelist: &Option<Vec<IpAddr>>) {
    match whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Robokassa IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 result callbacks."
            );
        },
        None => {
            info!("🪛️ No Robokassa IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Robokassa IP whitelist: {addrs}");
        },
    }
}
