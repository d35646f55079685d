use crate::error::LinkParseError;
use crate::models::{CommonProxyOptions, ProxyDescriptor, VlessProxy};

use super::common::LinkParts;
use super::transport::{reality_options, stream_transport};

/// Parse a `vless://uuid@host:port?params#name` link into a descriptor.
pub fn explode_vless(parts: &LinkParts, proxy_name: &str) -> Result<ProxyDescriptor, LinkParseError> {
    let server = parts.server()?;
    let uuid = parts.credential();

    let params = &parts.params;
    let network = params.get_or("type", "tcp");
    let security = params.get_or("security", "none");

    let common = CommonProxyOptions::builder(proxy_name, server, parts.port())
        .udp(true)
        .tfo(Some(params.get_bool(&["fast-open"], false)))
        .skip_cert_verify(Some(params.get_bool(&["insecure", "skip-cert-verify"], false)))
        .servername(params.get("sni").map(str::to_string))
        .alpn(params.get_list("alpn"))
        .build();

    let mut proxy = VlessProxy::new(common, uuid);
    proxy.flow = params.get("flow").map(str::to_string);
    proxy.packet_encoding = params
        .first_of(&["packet_encoding", "packet-encoding"])
        .map(str::to_string);

    if security == "reality" {
        proxy.common.tls = Some(true);
        proxy.reality_opts = Some(reality_options(params));
        proxy.common.client_fingerprint = Some(params.get_or("fp", "chrome"));
    } else if security == "tls" || params.get_bool(&["tls"], false) {
        proxy.common.tls = Some(true);
        proxy.common.client_fingerprint = params.get("fp").map(str::to_string);
    }

    proxy.transport = stream_transport(&network, params, true);
    Ok(ProxyDescriptor::Vless(proxy))
}
