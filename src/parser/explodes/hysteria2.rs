use crate::error::LinkParseError;
use crate::models::{CommonProxyOptions, Hysteria2Proxy, ProxyDescriptor};

use super::common::LinkParts;

/// Parse a `hysteria2://` or `hy2://` link into a descriptor.
///
/// The password comes from the userinfo, falling back to the `auth` parameter.
pub fn explode_hysteria2(
    parts: &LinkParts,
    proxy_name: &str,
) -> Result<ProxyDescriptor, LinkParseError> {
    let server = parts.server()?;
    let params = &parts.params;

    let mut password = parts.credential();
    if password.is_empty() {
        password = params.get_or("auth", "");
    }

    let common = CommonProxyOptions::builder(proxy_name, server, parts.port())
        .udp(true)
        .sni(params.first_of(&["sni", "peer"]).map(str::to_string))
        .skip_cert_verify(Some(params.get_bool(
            &["insecure", "skip-cert-verify", "allowInsecure"],
            false,
        )))
        .alpn(params.get_list("alpn"))
        .build();

    let mut proxy = Hysteria2Proxy::new(common, password);
    if let Some(obfs) = params.get("obfs") {
        proxy.obfs = Some(obfs.to_string());
        proxy.obfs_password = Some(params.get_or("obfs-password", ""));
    }
    proxy.up = bandwidth(params.get_int("up"), params.get_int("upmbps"));
    proxy.down = bandwidth(params.get_int("down"), params.get_int("downmbps"));
    proxy.ports = params.get("ports").map(str::to_string);
    proxy.hop_interval = params.get_int("hop-interval");

    Ok(ProxyDescriptor::Hysteria2(proxy))
}

/// First non-zero of the primary and alias values.
fn bandwidth(primary: Option<u32>, alias: Option<u32>) -> Option<u32> {
    primary.filter(|v| *v != 0).or(alias).filter(|v| *v != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(link: &str) -> Hysteria2Proxy {
        match explode_hysteria2(&LinkParts::parse(link).unwrap(), "n").unwrap() {
            ProxyDescriptor::Hysteria2(proxy) => proxy,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_hy2_with_obfs_and_bandwidth() {
        let proxy = parse(
            "hy2://s3cr%2Bt@example.com:8443?peer=sni.example.com&obfs=salamander\
             &obfs-password=op&up=0&upmbps=50&down=100&allowInsecure=1#HY",
        );
        assert_eq!(proxy.password, "s3cr+t");
        assert_eq!(proxy.common.sni.as_deref(), Some("sni.example.com"));
        assert_eq!(proxy.common.skip_cert_verify, Some(true));
        assert_eq!(proxy.obfs.as_deref(), Some("salamander"));
        assert_eq!(proxy.obfs_password.as_deref(), Some("op"));
        assert_eq!(proxy.up, Some(50));
        assert_eq!(proxy.down, Some(100));
    }

    #[test]
    fn test_auth_param_and_ports() {
        let proxy = parse("hysteria2://example.com?auth=token&ports=20000-30000&hop-interval=30");
        assert_eq!(proxy.password, "token");
        assert_eq!(proxy.common.port, 443);
        assert_eq!(proxy.ports.as_deref(), Some("20000-30000"));
        assert_eq!(proxy.hop_interval, Some(30));
        assert_eq!(proxy.common.skip_cert_verify, Some(false));
        assert_eq!(proxy.up, None);
    }
}
