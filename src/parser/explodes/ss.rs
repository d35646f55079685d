use serde_json::{json, Value as JsonValue};

use crate::error::LinkParseError;
use crate::models::{CommonProxyOptions, ProxyDescriptor, ShadowsocksProxy};
use crate::utils::address::bracket_ipv6;
use crate::utils::base64::safe_base64_decode;
use crate::utils::params::QueryParams;

/// Parse an SS link into a descriptor.
///
/// Accepts both SIP002 (`ss://base64(method:password)@host:port`) and the
/// legacy form where the whole body is Base64. A userinfo that is itself
/// Base64 of `method:password` is decoded as well.
pub fn explode_ss(
    ss: &str,
    params: &QueryParams,
    proxy_name: &str,
) -> Result<ProxyDescriptor, LinkParseError> {
    let mut body = ss.split_once("://").map_or(ss, |(_, body)| body);
    if let Some((head, _)) = body.split_once('#') {
        body = head;
    }
    if let Some((head, _)) = body.split_once('?') {
        body = head;
    }
    let body = body.trim_end_matches('/');

    let body = if body.contains('@') {
        body.to_string()
    } else {
        safe_base64_decode(body).ok_or(LinkParseError::InvalidBase64)?
    };

    let (userinfo, host_part) = body
        .rsplit_once('@')
        .ok_or(LinkParseError::MissingField("server"))?;
    let userinfo = if userinfo.contains(':') {
        userinfo.to_string()
    } else {
        safe_base64_decode(userinfo).unwrap_or_else(|| userinfo.to_string())
    };
    let (method, password) = userinfo
        .split_once(':')
        .ok_or(LinkParseError::MissingField("password"))?;

    let (server, port) = host_part
        .rsplit_once(':')
        .ok_or(LinkParseError::MissingField("port"))?;
    if server.is_empty() {
        return Err(LinkParseError::MissingField("server"));
    }
    let port: u16 = port.parse().map_err(|_| LinkParseError::InvalidField {
        field: "port",
        value: port.to_string(),
    })?;

    let common = CommonProxyOptions::builder(proxy_name, bracket_ipv6(server), port)
        .udp(true)
        .tfo(Some(params.get_bool(&["fast-open"], false)))
        .build();
    let mut proxy = ShadowsocksProxy::new(common, method, password);

    if let Some(plugin) = params.get("plugin") {
        let (name, inline_opts) = match plugin.split_once(';') {
            Some((name, opts)) => (name, Some(opts)),
            None => (plugin, None),
        };
        proxy.plugin = Some(name.to_string());
        proxy.plugin_opts = Some(plugin_options(params.get("plugin_opts").or(inline_opts)));
    }

    Ok(ProxyDescriptor::Shadowsocks(proxy))
}

/// Plugin options: a JSON document when the raw value is one, otherwise the
/// raw string wrapped as `{"options": ...}`.
fn plugin_options(raw: Option<&str>) -> JsonValue {
    match raw.filter(|raw| !raw.is_empty()) {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| json!({ "options": raw })),
        None => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    fn parse(link: &str) -> ShadowsocksProxy {
        let query = link.split_once('?').map_or("", |(_, q)| q);
        let query = query.split_once('#').map_or(query, |(q, _)| q);
        match explode_ss(link, &QueryParams::parse(query), "n").unwrap() {
            ProxyDescriptor::Shadowsocks(proxy) => proxy,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sip002_base64_userinfo() {
        let proxy = parse("ss://YWVzLTI1Ni1nY206cGFzcw==@example.com:8388#Node");
        assert_eq!(proxy.cipher, "aes-256-gcm");
        assert_eq!(proxy.password, "pass");
        assert_eq!(proxy.common.server, "example.com");
        assert_eq!(proxy.common.port, 8388);
        assert!(proxy.common.udp);
        assert_eq!(proxy.plugin, None);
    }

    #[test]
    fn test_legacy_whole_body_base64() {
        let body = base64_encode("chacha20-ietf-poly1305:p:w@2001:db8::1:8388");
        let proxy = parse(&format!("ss://{}#Legacy", body));
        assert_eq!(proxy.cipher, "chacha20-ietf-poly1305");
        assert_eq!(proxy.password, "p:w");
        assert_eq!(proxy.common.server, "[2001:db8::1]");
        assert_eq!(proxy.common.port, 8388);
    }

    #[test]
    fn test_plugin_options() {
        let proxy = parse(
            "ss://aes-128-gcm:pw@h.example.com:443/?plugin=v2ray-plugin\
             &plugin_opts=%7B%22mode%22%3A%22websocket%22%7D",
        );
        assert_eq!(proxy.plugin.as_deref(), Some("v2ray-plugin"));
        assert_eq!(proxy.plugin_opts, Some(json!({"mode": "websocket"})));

        let proxy = parse("ss://aes-128-gcm:pw@h:443?plugin=obfs-local%3Bobfs%3Dhttp");
        assert_eq!(proxy.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(proxy.plugin_opts, Some(json!({"options": "obfs=http"})));

        let proxy = parse("ss://aes-128-gcm:pw@h:443?plugin=simple-obfs");
        assert_eq!(proxy.plugin_opts, Some(json!({})));
    }

    #[test]
    fn test_malformed() {
        let params = QueryParams::default();
        assert_eq!(
            explode_ss("ss://aes-128-gcm:pw@hostonly", &params, "n"),
            Err(LinkParseError::MissingField("port"))
        );
        assert_eq!(
            explode_ss("ss://%%%", &params, "n"),
            Err(LinkParseError::InvalidBase64)
        );
        assert_eq!(
            explode_ss(&format!("ss://{}@h:1", base64_encode("nocolon")), &params, "n"),
            Err(LinkParseError::MissingField("password"))
        );
    }
}
