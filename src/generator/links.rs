//! Descriptor to share-link serialization.

use serde_json::json;

use crate::models::{
    Hysteria2Proxy, ProxyDescriptor, ShadowsocksProxy, TransportOptions, TrojanProxy, TuicProxy,
    VMessProxy, VlessProxy,
};
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::url::url_encode;

/// Convert a descriptor back into its share link.
///
/// Parsing the result yields the same descriptor apart from the name, which
/// is carried in the fragment (or the VMess `ps` field).
pub fn descriptor_to_link(proxy: &ProxyDescriptor) -> String {
    match proxy {
        ProxyDescriptor::VMess(p) => vmess_link(p),
        ProxyDescriptor::Vless(p) => vless_link(p),
        ProxyDescriptor::Trojan(p) => trojan_link(p),
        ProxyDescriptor::Hysteria2(p) => hysteria2_link(p),
        ProxyDescriptor::Tuic(p) => tuic_link(p),
        ProxyDescriptor::Shadowsocks(p) => ss_link(p),
    }
}

/// Ordered `key=value` query builder; blank values are left out.
#[derive(Default)]
struct Query {
    pairs: Vec<String>,
}

impl Query {
    fn push(&mut self, key: &str, value: impl AsRef<str>) {
        let value = value.as_ref();
        if !value.is_empty() {
            self.pairs.push(format!("{}={}", key, url_encode(value)));
        }
    }

    fn push_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    fn push_flag(&mut self, key: &str, value: Option<bool>) {
        if value == Some(true) {
            self.push(key, "1");
        }
    }

    fn push_list(&mut self, key: &str, values: Option<&[String]>) {
        if let Some(values) = values {
            self.push(key, values.join(","));
        }
    }

    fn into_suffix(self) -> String {
        if self.pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", self.pairs.join("&"))
        }
    }
}

fn push_transport(query: &mut Query, transport: &TransportOptions) {
    query.push("type", transport.network_name());
    if let Some(ws) = &transport.ws_opts {
        query.push("path", &ws.path);
        query.push_opt("host", ws.host());
    }
    if let Some(grpc) = &transport.grpc_opts {
        query.push("serviceName", &grpc.grpc_service_name);
    }
    if let Some(h2) = &transport.h2_opts {
        query.push("path", h2.path.join(","));
        query.push_list("host", h2.host.as_deref());
    }
    if let Some(http) = &transport.http_opts {
        query.push("path", http.path.join(","));
        query.push("host", http.hosts().join(","));
    }
}

fn vmess_link(p: &VMessProxy) -> String {
    let transport = &p.transport;
    let (net, fake_type, host, path) = if let Some(ws) = &transport.ws_opts {
        ("ws", "none", ws.host().unwrap_or_default().to_string(), ws.path.clone())
    } else if let Some(http) = &transport.http_opts {
        let host = http.hosts().first().cloned().unwrap_or_default();
        let path = http.path.first().cloned().unwrap_or_default();
        ("tcp", "http", host, path)
    } else if let Some(h2) = &transport.h2_opts {
        let host = h2
            .host
            .as_ref()
            .and_then(|hosts| hosts.first().cloned())
            .unwrap_or_default();
        ("h2", "none", host, h2.path.first().cloned().unwrap_or_default())
    } else if let Some(grpc) = &transport.grpc_opts {
        ("grpc", "none", String::new(), grpc.grpc_service_name.clone())
    } else {
        (transport.network_name(), "none", String::new(), String::new())
    };

    let tls = p.common.tls == Some(true);
    let mut vmess_json = json!({
        "v": "2",
        "ps": p.common.name,
        "add": p.common.server,
        "port": p.common.port.to_string(),
        "id": p.uuid,
        "aid": p.alter_id,
        "scy": p.cipher,
        "net": net,
        "type": fake_type,
        "host": host,
        "path": path,
        "tls": if tls { "tls" } else { "" },
        "sni": p.common.servername.clone().unwrap_or_default(),
    });
    if p.common.skip_cert_verify == Some(true) {
        vmess_json["skip-cert-verify"] = json!(true);
    }
    if let Some(encoding) = &p.packet_encoding {
        vmess_json["packet-encoding"] = json!(encoding);
    }

    format!("vmess://{}", base64_encode(&vmess_json.to_string()))
}

fn vless_link(p: &VlessProxy) -> String {
    let mut query = Query::default();
    let security = if p.reality_opts.is_some() {
        "reality"
    } else if p.common.tls == Some(true) {
        "tls"
    } else {
        "none"
    };
    query.push("security", security);
    query.push_opt("sni", p.common.servername.as_deref());
    query.push_opt("fp", p.common.client_fingerprint.as_deref());
    if let Some(reality) = &p.reality_opts {
        query.push("pbk", &reality.public_key);
        query.push("sid", &reality.short_id);
    }
    query.push_opt("flow", p.flow.as_deref());
    query.push_list("alpn", p.common.alpn.as_deref());
    query.push_opt("packet-encoding", p.packet_encoding.as_deref());
    query.push_flag("insecure", p.common.skip_cert_verify);
    query.push_flag("fast-open", p.common.tfo);
    push_transport(&mut query, &p.transport);

    format!(
        "vless://{}@{}:{}{}#{}",
        url_encode(&p.uuid),
        p.common.server,
        p.common.port,
        query.into_suffix(),
        url_encode(&p.common.name)
    )
}

fn trojan_link(p: &TrojanProxy) -> String {
    let mut query = Query::default();
    if let Some(reality) = &p.reality_opts {
        query.push("security", "reality");
        query.push("pbk", &reality.public_key);
        query.push("sid", &reality.short_id);
    }
    query.push_opt("sni", p.common.sni.as_deref());
    query.push_opt("fp", p.common.client_fingerprint.as_deref());
    query.push_list("alpn", p.common.alpn.as_deref());
    query.push_flag("insecure", p.common.skip_cert_verify);
    query.push_flag("fast-open", p.common.tfo);
    push_transport(&mut query, &p.transport);

    format!(
        "trojan://{}@{}:{}{}#{}",
        url_encode(&p.password),
        p.common.server,
        p.common.port,
        query.into_suffix(),
        url_encode(&p.common.name)
    )
}

fn hysteria2_link(p: &Hysteria2Proxy) -> String {
    let mut query = Query::default();
    query.push_opt("sni", p.common.sni.as_deref());
    query.push_flag("insecure", p.common.skip_cert_verify);
    query.push_opt("obfs", p.obfs.as_deref());
    query.push_opt("obfs-password", p.obfs_password.as_deref());
    if let Some(up) = p.up {
        query.push("up", up.to_string());
    }
    if let Some(down) = p.down {
        query.push("down", down.to_string());
    }
    query.push_list("alpn", p.common.alpn.as_deref());
    query.push_opt("ports", p.ports.as_deref());
    if let Some(hop) = p.hop_interval {
        query.push("hop-interval", hop.to_string());
    }

    format!(
        "hysteria2://{}@{}:{}{}#{}",
        url_encode(&p.password),
        p.common.server,
        p.common.port,
        query.into_suffix(),
        url_encode(&p.common.name)
    )
}

fn tuic_link(p: &TuicProxy) -> String {
    let mut query = Query::default();
    query.push("congestion_controller", &p.congestion_controller);
    query.push("udp-relay-mode", &p.udp_relay_mode);
    query.push_list("alpn", p.common.alpn.as_deref());
    query.push_opt("sni", p.common.sni.as_deref());
    let insecure = p.common.skip_cert_verify.unwrap_or(true);
    query.push("insecure", if insecure { "1" } else { "0" });
    query.push_flag("disable-sni", Some(p.disable_sni));
    query.push_flag("reduce-rtt", Some(p.reduce_rtt));
    query.push_flag("zero-rtt", Some(p.zero_rtt));

    let userinfo = if p.password.is_empty() {
        url_encode(&p.uuid)
    } else {
        format!("{}:{}", url_encode(&p.uuid), url_encode(&p.password))
    };
    format!(
        "tuic://{}@{}:{}{}#{}",
        userinfo,
        p.common.server,
        p.common.port,
        query.into_suffix(),
        url_encode(&p.common.name)
    )
}

fn ss_link(p: &ShadowsocksProxy) -> String {
    let user_info = url_safe_base64_encode(&format!("{}:{}", p.cipher, p.password));
    let mut query = Query::default();
    query.push_flag("fast-open", p.common.tfo);
    if let Some(plugin) = &p.plugin {
        query.push("plugin", plugin);
        if let Some(opts) = &p.plugin_opts {
            query.push("plugin_opts", opts.to_string());
        }
    }

    format!(
        "ss://{}@{}:{}{}#{}",
        user_info,
        p.common.server,
        p.common.port,
        query.into_suffix(),
        url_encode(&p.common.name)
    )
}
