//! Authority parsing that tolerates unbracketed IPv6 literals.
//!
//! Share links in the wild frequently carry IPv6 hosts without the square
//! brackets RFC 3986 requires, e.g. `vless://id@2001:db8::1:443`. A strict URL
//! parser rejects those, so authorities are split by hand here and every IPv6
//! host that comes out is bracketed.

use std::net::Ipv6Addr;

use serde_json::Value as JsonValue;

use crate::utils::base64::{base64_encode, safe_base64_decode};
use crate::utils::url::split_fragment;

/// Port assumed when an authority does not carry one.
pub const DEFAULT_PORT: u16 = 443;

/// The three parts of a link authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuthority {
    /// Raw (still percent-encoded) credential part, empty when absent.
    pub userinfo: String,
    /// Host, with IPv6 literals always bracketed.
    pub server: String,
    pub port: u16,
}

impl ResolvedAuthority {
    /// Rebuilds a `userinfo@server:port` authority.
    pub fn to_netloc(&self) -> String {
        if self.userinfo.is_empty() {
            format!("{}:{}", self.server, self.port)
        } else {
            format!("{}@{}:{}", self.userinfo, self.server, self.port)
        }
    }
}

/// Splits `[userinfo@]host[:port]` into its parts.
///
/// The userinfo ends at the last `@`. A bracketed host keeps its brackets; a
/// host with two or more colons is an unbracketed IPv6 literal, and its final
/// colon-separated segment is read as the port only when it is all digits and
/// what remains still parses as an IPv6 address.
pub fn resolve_authority(netloc: &str, default_port: u16) -> ResolvedAuthority {
    let (userinfo, host_part) = match netloc.rsplit_once('@') {
        Some((userinfo, host_part)) => (userinfo, host_part),
        None => ("", netloc),
    };
    let (server, port) = split_host_port(host_part, default_port);
    ResolvedAuthority {
        userinfo: userinfo.to_string(),
        server,
        port,
    }
}

fn split_host_port(host_part: &str, default_port: u16) -> (String, u16) {
    if host_part.starts_with('[') {
        if let Some(close) = host_part.find(']') {
            let rest = &host_part[close + 1..];
            if let Some(port) = rest.strip_prefix(':').and_then(parse_port) {
                return (host_part[..=close].to_string(), port);
            }
        }
        return (host_part.to_string(), default_port);
    }

    if host_part.matches(':').count() >= 2 {
        if let Some((addr, port_str)) = host_part.rsplit_once(':') {
            if let Some(port) = parse_port(port_str) {
                if addr.parse::<Ipv6Addr>().is_ok() {
                    return (format!("[{}]", addr), port);
                }
            }
        }
        return (format!("[{}]", host_part), default_port);
    }

    match host_part.rsplit_once(':') {
        Some((host, port_str)) => match parse_port(port_str) {
            Some(port) => (host.to_string(), port),
            None => (host.to_string(), default_port),
        },
        None => (host_part.to_string(), default_port),
    }
}

fn parse_port(input: &str) -> Option<u16> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// Wraps a bare IPv6 literal in square brackets.
pub fn bracket_ipv6(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Rewrites a share link so that its host is bracketed when it is IPv6.
///
/// VMess links are rewritten inside their Base64 JSON payload. Legacy
/// Shadowsocks links whose whole body is Base64 have no authority and are
/// returned unchanged, as is anything that fails to decode.
pub fn fix_link_ipv6(link: &str) -> String {
    let Some((scheme, rest)) = link.split_once("://") else {
        return link.to_string();
    };
    if scheme.eq_ignore_ascii_case("vmess") {
        return fix_vmess_ipv6(scheme, rest).unwrap_or_else(|| link.to_string());
    }

    let end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
    let (netloc, tail) = rest.split_at(end);
    if netloc.is_empty() {
        return link.to_string();
    }
    if scheme.eq_ignore_ascii_case("ss") && !netloc.contains('@') {
        return link.to_string();
    }

    let authority = resolve_authority(netloc, DEFAULT_PORT);
    format!("{}://{}{}", scheme, authority.to_netloc(), tail)
}

fn fix_vmess_ipv6(scheme: &str, body: &str) -> Option<String> {
    let (payload, fragment) = split_fragment(body);
    let decoded = safe_base64_decode(payload)?;
    let mut value: JsonValue = serde_json::from_str(&decoded).ok()?;

    let add = value.get("add")?.as_str()?;
    if !add.contains(':') || add.starts_with('[') {
        return None;
    }
    let bracketed = format!("[{}]", add);
    value
        .as_object_mut()?
        .insert("add".to_string(), JsonValue::String(bracketed));

    let json = serde_json::to_string(&value).ok()?;
    let mut fixed = format!("{}://{}", scheme, base64_encode(&json));
    if let Some(fragment) = fragment {
        fixed.push('#');
        fixed.push_str(fragment);
    }
    Some(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_host() {
        let auth = resolve_authority("user@example.com:8443", DEFAULT_PORT);
        assert_eq!(auth.userinfo, "user");
        assert_eq!(auth.server, "example.com");
        assert_eq!(auth.port, 8443);

        let auth = resolve_authority("example.com", DEFAULT_PORT);
        assert_eq!(auth.userinfo, "");
        assert_eq!(auth.port, 443);
    }

    #[test]
    fn test_resolve_bracketed_ipv6() {
        let auth = resolve_authority("id@[2001:db8::1]:8443", DEFAULT_PORT);
        assert_eq!(auth.server, "[2001:db8::1]");
        assert_eq!(auth.port, 8443);

        let auth = resolve_authority("[::1]", DEFAULT_PORT);
        assert_eq!(auth.server, "[::1]");
        assert_eq!(auth.port, 443);
    }

    #[test]
    fn test_resolve_unbracketed_ipv6() {
        let auth = resolve_authority("2001:db8::1", DEFAULT_PORT);
        assert_eq!(auth.server, "[2001:db8::1]");
        assert_eq!(auth.port, 443);

        let auth = resolve_authority("uuid@2001:db8::1:8443", DEFAULT_PORT);
        assert_eq!(auth.userinfo, "uuid");
        assert_eq!(auth.server, "[2001:db8::1]");
        assert_eq!(auth.port, 8443);

        let auth = resolve_authority("fe80::1", DEFAULT_PORT);
        assert_eq!(auth.server, "[fe80::1]");
        assert_eq!(auth.port, 443);
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        for authority in ["pw@h.example.com:99999", "pw@h.example.com:abc"] {
            let auth = resolve_authority(authority, DEFAULT_PORT);
            assert_eq!(auth.server, "h.example.com", "{}", authority);
            assert_eq!(auth.port, DEFAULT_PORT, "{}", authority);
        }
        assert_eq!(
            fix_link_ipv6("trojan://pw@h.example.com:99999#n"),
            "trojan://pw@h.example.com:443#n"
        );
    }

    #[test]
    fn test_userinfo_ends_at_last_at_sign() {
        let auth = resolve_authority("a@b@host:80", DEFAULT_PORT);
        assert_eq!(auth.userinfo, "a@b");
        assert_eq!(auth.server, "host");
        assert_eq!(auth.port, 80);
    }

    #[test]
    fn test_fix_link_brackets_host() {
        assert_eq!(
            fix_link_ipv6("vless://id@2001:db8::1:443?type=ws#n"),
            "vless://id@[2001:db8::1]:443?type=ws#n"
        );
        assert_eq!(
            fix_link_ipv6("trojan://pw@example.com:443#n"),
            "trojan://pw@example.com:443#n"
        );
        assert_eq!(
            fix_link_ipv6("ss://YWVzLTI1Ni1nY206cGFzcw"),
            "ss://YWVzLTI1Ni1nY206cGFzcw"
        );
    }

    #[test]
    fn test_fix_vmess_payload() {
        let payload = base64_encode(r#"{"add":"2001:db8::1","port":"443","id":"x"}"#);
        let fixed = fix_link_ipv6(&format!("vmess://{}", payload));
        let body = fixed.strip_prefix("vmess://").unwrap();
        let decoded = safe_base64_decode(body).unwrap();
        let value: JsonValue = serde_json::from_str(&decoded).unwrap();
        assert_eq!(value["add"], "[2001:db8::1]");

        let untouched = format!(
            "vmess://{}",
            base64_encode(r#"{"add":"example.com","port":"443"}"#)
        );
        assert_eq!(fix_link_ipv6(&untouched), untouched);
    }
}
