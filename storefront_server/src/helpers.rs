use std::{net::IpAddr, str::FromStr, sync::OnceLock};

use actix_web::HttpRequest;
use log::{debug, trace, warn};
use regex::Regex;

static FORWARDED_FOR: OnceLock<Option<Regex>> = OnceLock::new();

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
///
/// When a proxy chain has appended several addresses, the first (client-most) one is used.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(parse_forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// Checks a peer against an optional whitelist. Without a whitelist, every peer is allowed. With one, peers whose
/// address cannot be determined are refused.
pub fn is_whitelisted(peer_ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer_ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            let allowed = whitelist.contains(&ip);
            if !allowed {
                warn!("💻️ Rejecting a request from {ip}, which is not whitelisted.");
            }
            allowed
        },
        (None, Some(_)) => {
            warn!("💻️ No IP address found in remote peer request, denying access.");
            false
        },
    }
}

/// Extracts the address in the `for=` field of a `Forwarded` header value (RFC 7239). IPv6 addresses may be quoted
/// and bracketed.
fn parse_forwarded_for(value: &str) -> Option<IpAddr> {
    let re = FORWARDED_FOR.get_or_init(|| Regex::new(r#"(?i)for=(?P<ip>[^;,]+)"#).ok()).as_ref()?;
    let ip = re.captures(value)?.name("ip")?.as_str();
    let ip = ip.trim().trim_matches('"').trim_start_matches('[');
    let ip = ip.split(']').next().unwrap_or(ip);
    IpAddr::from_str(ip).ok()
}
