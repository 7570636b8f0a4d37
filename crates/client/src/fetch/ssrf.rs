//! SSRF (Server-Side Request Forgery) protection.
//!
//! Candidate URLs come from scraped third-party pages, so before downloading
//! we make sure neither the literal host nor any resolved address points at
//! private, internal, or reserved space.
use std::net::IpAddr;

use url::{Host, Url};

/// Error type for SSRF validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsrfError {
    #[error("missing host in {0}")]
    MissingHost(String),

    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Link-local addresses (169.254/16, fe80::/10)
/// - Multicast addresses (224/4, ff00::/8)
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 addresses, judged by their IPv4 form
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that an IP address is not private or reserved.
///
/// Returns an error if the IP is blocked.
pub fn validate_ip(ip: IpAddr) -> Result<(), SsrfError> {
    if is_private_or_reserved(ip) { Err(SsrfError::BlockedIp(ip)) } else { Ok(()) }
}

/// Check the URL's host, resolving names through the system resolver.
///
/// Every resolved address must be public; one private answer blocks the URL.
pub async fn check_url(url: &Url) -> Result<(), SsrfError> {
    let port = url.port_or_known_default().unwrap_or(443);

    let name = match url.host() {
        Some(Host::Ipv4(v4)) => return validate_ip(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => return validate_ip(IpAddr::V6(v6)),
        Some(Host::Domain(name)) => name.to_string(),
        None => return Err(SsrfError::MissingHost(url.to_string())),
    };

    let addrs = tokio::net::lookup_host((name.as_str(), port))
        .await
        .map_err(|e| SsrfError::DnsError(format!("{name}: {e}")))?;

    let mut resolved = 0usize;
    for addr in addrs {
        validate_ip(addr.ip())?;
        resolved += 1;
    }

    if resolved == 0 {
        return Err(SsrfError::DnsError(format!("{name}: no addresses")));
    }

    Ok(())
}
