//! Splitting a subscription feed body into share-link candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::utils::address::{resolve_authority, DEFAULT_PORT};
use crate::utils::base64::safe_base64_decode;
use crate::utils::url::{split_fragment, url_decode};

static SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://").expect("valid scheme regex"));

/// Name given to a link that carries none and has no readable authority.
pub const UNKNOWN_NODE_NAME: &str = "Unknown Node";

/// One share link found in a feed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Display name from the fragment, else `host:port`.
    pub name: String,
    /// Key under which the link is stored in a node's `links` map.
    pub protocol: String,
    pub link: String,
}

/// Normalized link key for a scheme, or `None` for unsupported schemes.
pub fn protocol_key(scheme: &str) -> Option<&'static str> {
    match scheme.to_ascii_lowercase().as_str() {
        "vmess" => Some("vmess"),
        "vless" => Some("vless"),
        "trojan" => Some("trojan"),
        "tuic" => Some("tuic"),
        "socks5" => Some("socks5"),
        "ss" | "shadowsocks" => Some("ss"),
        "hysteria2" | "hy2" => Some("hy2"),
        _ => None,
    }
}

/// Extracts share links from a feed body.
///
/// The body is Base64-decoded first when the whole of it decodes to text;
/// otherwise it is read as plain text. Lines with unsupported schemes are
/// skipped.
pub fn extract_nodes_from_content(content: &str) -> Vec<ExtractedLink> {
    let text = safe_base64_decode(content).unwrap_or_else(|| content.to_string());

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let scheme = SCHEME_REGEX.captures(line)?.get(1)?.as_str();
            let protocol = protocol_key(scheme)?;
            Some(ExtractedLink {
                name: link_name(line, protocol),
                protocol: protocol.to_string(),
                link: line.to_string(),
            })
        })
        .collect()
}

fn link_name(line: &str, protocol: &str) -> String {
    if let Some((_, fragment)) = line.rsplit_once('#') {
        let name = url_decode(fragment).trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    let fallback = if protocol == "vmess" {
        vmess_name(line)
    } else {
        authority_name(line)
    };
    fallback.unwrap_or_else(|| UNKNOWN_NODE_NAME.to_string())
}

fn authority_name(line: &str) -> Option<String> {
    let (_, rest) = line.split_once("://")?;
    let (rest, _) = split_fragment(rest);
    let end = rest.find(&['/', '?'][..]).unwrap_or(rest.len());
    let authority = resolve_authority(&rest[..end], DEFAULT_PORT);
    if authority.server.is_empty() {
        return None;
    }
    Some(format!("{}:{}", authority.server, authority.port))
}

/// VMess links keep their name inside the payload (`ps`), or fall back to
/// `add:port`.
fn vmess_name(line: &str) -> Option<String> {
    let (_, body) = line.split_once("://")?;
    let (payload, _) = split_fragment(body);
    let v: JsonValue = serde_json::from_str(&safe_base64_decode(payload)?).ok()?;

    if let Some(ps) = v.get("ps").and_then(JsonValue::as_str) {
        if !ps.trim().is_empty() {
            return Some(ps.trim().to_string());
        }
    }
    let add = v.get("add").and_then(JsonValue::as_str)?;
    let port = match v.get("port") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => DEFAULT_PORT.to_string(),
    };
    Some(format!("{}:{}", add, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_plain_body() {
        let body = "vless://u@a.example.com:443?type=ws#%F0%9F%87%BA%F0%9F%87%B8%20US\n\
                    \n\
                    wireguard://ignored@h:1\n\
                    Shadowsocks://YWVzLTI1Ni1nY206cGFzcw==@b.example.com:8388\n\
                    hysteria2://pw@c.example.com:8443#HY  \n";
        let links = extract_nodes_from_content(body);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].name, "🇺🇸 US");
        assert_eq!(links[0].protocol, "vless");
        assert_eq!(links[1].protocol, "ss");
        assert_eq!(links[1].name, "b.example.com:8388");
        assert_eq!(links[2].protocol, "hy2");
        assert_eq!(links[2].name, "HY");
        assert_eq!(links[2].link, "hysteria2://pw@c.example.com:8443#HY");
    }

    #[test]
    fn test_base64_body() {
        let plain = "trojan://pw@t.example.com:443#T1\r\nss://YWVzLTI1Ni1nY206cGFzcw==@s.example.com:8388#S1";
        let links = extract_nodes_from_content(&base64_encode(plain));
        let names: Vec<_> = links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["T1", "S1"]);
    }

    #[test]
    fn test_vmess_name_from_payload() {
        let named = format!("vmess://{}", base64_encode(r#"{"ps":"HK 01","add":"h","port":443}"#));
        let unnamed = format!("vmess://{}", base64_encode(r#"{"add":"h","port":"8080"}"#));
        let links = extract_nodes_from_content(&format!("{}\n{}", named, unnamed));
        assert_eq!(links[0].name, "HK 01");
        assert_eq!(links[1].name, "h:8080");
    }

    #[test]
    fn test_fallback_names() {
        let links = extract_nodes_from_content("tuic://u:p@2001:db8::1:443\nsocks5://#");
        assert_eq!(links[0].name, "[2001:db8::1]:443");
        assert_eq!(links[1].name, UNKNOWN_NODE_NAME);
    }
}
