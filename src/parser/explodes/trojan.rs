use crate::error::LinkParseError;
use crate::models::{CommonProxyOptions, ProxyDescriptor, TrojanProxy};

use super::common::LinkParts;
use super::transport::{reality_options, stream_transport};

/// Parse a `trojan://password@host:port?params#name` link into a descriptor.
pub fn explode_trojan(parts: &LinkParts, proxy_name: &str) -> Result<ProxyDescriptor, LinkParseError> {
    let server = parts.server()?;
    let password = parts.credential();

    let params = &parts.params;
    let network = params.get_or("type", "tcp");
    let security = params.get_or("security", "tls");

    let common = CommonProxyOptions::builder(proxy_name, server, parts.port())
        .udp(true)
        .tfo(Some(params.get_bool(&["fast-open"], false)))
        .skip_cert_verify(Some(params.get_bool(&["insecure", "skip-cert-verify"], false)))
        .sni(params.get("sni").map(str::to_string))
        .alpn(params.get_list("alpn"))
        .client_fingerprint(params.get("fp").map(str::to_string))
        .build();

    let mut proxy = TrojanProxy::new(common, password);
    if security == "reality" {
        proxy.reality_opts = Some(reality_options(params));
    }
    proxy.transport = stream_transport(&network, params, false);

    Ok(ProxyDescriptor::Trojan(proxy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(link: &str) -> TrojanProxy {
        match explode_trojan(&LinkParts::parse(link).unwrap(), "n").unwrap() {
            ProxyDescriptor::Trojan(proxy) => proxy,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_basic_trojan() {
        let proxy = parse("trojan://p%40ss@example.com:443?sni=example.com&alpn=h2,http/1.1#T");
        assert_eq!(proxy.password, "p@ss");
        assert_eq!(proxy.common.sni.as_deref(), Some("example.com"));
        assert_eq!(
            proxy.common.alpn,
            Some(vec!["h2".to_string(), "http/1.1".to_string()])
        );
        assert_eq!(proxy.common.skip_cert_verify, Some(false));
        assert!(proxy.reality_opts.is_none());
    }

    #[test]
    fn test_grpc_and_reality() {
        let proxy = parse("trojan://pw@h:443?type=grpc&serviceName=svc&security=reality&pbk=K&sid=1");
        assert_eq!(proxy.transport.grpc_opts.unwrap().grpc_service_name, "svc");
        assert_eq!(proxy.reality_opts.unwrap().public_key, "K");
    }

    #[test]
    fn test_h2_is_not_a_trojan_transport() {
        let proxy = parse("trojan://pw@h:443?type=h2&path=/x");
        assert_eq!(proxy.transport.network.as_deref(), Some("h2"));
        assert!(proxy.transport.h2_opts.is_none());
    }

    #[test]
    fn test_missing_password_still_parses() {
        let proxy = parse("trojan://example.com:443#n");
        assert_eq!(proxy.password, "");
        assert_eq!(proxy.common.server, "example.com");
    }
}
