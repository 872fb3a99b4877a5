use crate::error::ProxyError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Turn the `url` query parameter into a fetchable target.
///
/// Accepts only absolute `http://` and `https://` URLs with a host. Unless
/// `allow_private` is set, IP literals in private or reserved ranges are
/// refused (SSRF protection).
///
/// **Hostnames** are accepted without DNS resolution; a name resolving to a
/// private address is not caught here.
///
/// # Errors
/// - [`ProxyError::MissingParameter`] when the parameter is absent or blank
/// - [`ProxyError::InvalidTarget`] for unparseable URLs, other schemes,
///   missing hosts and refused addresses
pub fn parse_target(raw: Option<&str>, allow_private: bool) -> Result<Url, ProxyError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ProxyError::MissingParameter)?;

    let parsed =
        Url::parse(raw).map_err(|e| ProxyError::InvalidTarget(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ProxyError::InvalidTarget(format!(
                "scheme '{scheme}' not allowed, only http/https permitted"
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| ProxyError::InvalidTarget(format!("no host in URL: {raw}")))?;

    if allow_private {
        return Ok(parsed);
    }

    match host {
        Host::Ipv4(ip) if is_blocked_ipv4(ip) => Err(ProxyError::InvalidTarget(format!(
            "private or reserved IPv4 address not allowed: {ip}"
        ))),
        Host::Ipv6(ip) if is_blocked_ipv6(ip) => Err(ProxyError::InvalidTarget(format!(
            "private or reserved IPv6 address not allowed: {ip}"
        ))),
        Host::Domain(domain) if domain.eq_ignore_ascii_case("localhost") => Err(
            ProxyError::InvalidTarget("localhost not allowed".to_string()),
        ),
        _ => Ok(parsed),
    }
}

/// Returns `true` for IPv4 addresses in private or reserved ranges.
///
/// Blocked ranges:
/// - `0.0.0.0/8`      "this" network, includes the unspecified address
/// - `10.0.0.0/8`     RFC 1918 private
/// - `100.64.0.0/10`  carrier-grade NAT
/// - `127.0.0.0/8`    loopback
/// - `169.254.0.0/16` link-local / cloud metadata
/// - `172.16.0.0/12`  RFC 1918 private
/// - `192.168.0.0/16` RFC 1918 private
fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();

    a == 0
        || a == 10
        || (a == 100 && (64..=127).contains(&b))
        || a == 127
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
}

/// Returns `true` for IPv6 addresses in private or reserved ranges.
///
/// Blocked: `::`, `::1`, `fe80::/10`, `fc00::/7`, and IPv4-mapped
/// (`::ffff:a.b.c.d`) forms of blocked IPv4 addresses.
fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_ipv4(v4);
    }

    let s = ip.segments();
    ip.is_unspecified()
        || ip.is_loopback()
        || (s[0] & 0xffc0) == 0xfe80
        || (s[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refused(url: &str) -> bool {
        matches!(
            parse_target(Some(url), false),
            Err(ProxyError::InvalidTarget(_))
        )
    }

    // --- Parameter presence ---

    #[test]
    fn missing_or_blank_parameter() {
        assert!(matches!(
            parse_target(None, false),
            Err(ProxyError::MissingParameter)
        ));
        assert!(matches!(
            parse_target(Some(""), false),
            Err(ProxyError::MissingParameter)
        ));
        assert!(matches!(
            parse_target(Some("   "), false),
            Err(ProxyError::MissingParameter)
        ));
    }

    // --- IPv4 ---

    #[test]
    fn rejects_loopback_and_rfc1918() {
        assert!(refused("http://127.0.0.1/live.m3u8"));
        assert!(refused("http://127.255.255.255/live.m3u8"));
        assert!(refused("http://10.1.2.3/live.m3u8"));
        assert!(refused("http://172.16.0.1/live.m3u8"));
        assert!(refused("http://172.31.255.255/live.m3u8"));
        assert!(refused("http://192.168.1.10/live.m3u8"));
    }

    #[test]
    fn rejects_metadata_cgnat_and_unspecified() {
        assert!(refused("http://169.254.169.254/latest/meta-data/"));
        assert!(refused("http://100.64.0.1/live.m3u8"));
        assert!(refused("http://100.127.255.255/live.m3u8"));
        assert!(refused("http://0.0.0.0/live.m3u8"));
    }

    #[test]
    fn range_boundaries_are_allowed() {
        assert!(parse_target(Some("http://172.15.255.255/a.m3u8"), false).is_ok());
        assert!(parse_target(Some("http://172.32.0.0/a.m3u8"), false).is_ok());
        assert!(parse_target(Some("http://100.63.255.255/a.m3u8"), false).is_ok());
        assert!(parse_target(Some("http://100.128.0.0/a.m3u8"), false).is_ok());
    }

    // --- IPv6 ---

    #[test]
    fn rejects_private_ipv6() {
        assert!(refused("http://[::1]/live.m3u8"));
        assert!(refused("http://[::]/live.m3u8"));
        assert!(refused("http://[fe80::1]/live.m3u8"));
        assert!(refused("http://[fd00::1]/live.m3u8"));
    }

    #[test]
    fn rejects_ipv4_mapped_private_addresses() {
        assert!(refused("http://[::ffff:127.0.0.1]/live.m3u8"));
        assert!(refused("http://[::ffff:10.0.0.1]/live.m3u8"));
        assert!(parse_target(Some("http://[::ffff:8.8.8.8]/live.m3u8"), false).is_ok());
    }

    #[test]
    fn rejects_localhost_name() {
        assert!(refused("http://localhost:8080/live.m3u8"));
        assert!(refused("http://LOCALHOST/live.m3u8"));
    }

    // --- Accepted targets ---

    #[test]
    fn accepts_public_targets() {
        let url = parse_target(
            Some("https://cdn.example.com/live/index.m3u8?token=abc"),
            false,
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
        assert_eq!(url.query(), Some("token=abc"));
        assert!(parse_target(Some("http://203.0.113.1/seg.ts"), false).is_ok());
    }

    #[test]
    fn private_targets_allowed_when_configured() {
        assert!(parse_target(Some("http://127.0.0.1:8080/live.m3u8"), true).is_ok());
        assert!(parse_target(Some("http://localhost/live.m3u8"), true).is_ok());
    }

    // --- Scheme and shape ---

    #[test]
    fn rejects_other_schemes() {
        assert!(refused("ftp://cdn.example.com/file.ts"));
        assert!(refused("file:///etc/passwd"));
        assert!(refused("skd://key-id"));
        // Scheme is checked even when private origins are allowed
        assert!(matches!(
            parse_target(Some("file:///etc/passwd"), true),
            Err(ProxyError::InvalidTarget(_))
        ));
    }

    #[test]
    fn rejects_relative_and_garbage() {
        assert!(refused("cdn.example.com/stream.m3u8"));
        assert!(refused("/proxy/m3u8"));
        assert!(refused("://missing-scheme"));
    }
}
