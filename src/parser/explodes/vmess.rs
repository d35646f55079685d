use serde_json::Value as JsonValue;

use crate::error::LinkParseError;
use crate::models::{
    CommonProxyOptions, GrpcOptions, H2Options, HttpOptions, ProxyDescriptor, TransportOptions,
    VMessProxy, WsOptions,
};
use crate::utils::address::{bracket_ipv6, DEFAULT_PORT};
use crate::utils::base64::safe_base64_decode;
use crate::utils::params::parse_flag;
use crate::utils::url::split_fragment;

/// Parse a `vmess://` link (Base64 JSON, v2rayN style) into a descriptor.
///
/// A `#name` suffix after the payload is ignored.
pub fn explode_vmess(link: &str, proxy_name: &str) -> Result<ProxyDescriptor, LinkParseError> {
    let body = link.split_once("://").map_or(link, |(_, body)| body);
    let (payload, _) = split_fragment(body);

    let decoded = safe_base64_decode(payload).ok_or(LinkParseError::InvalidBase64)?;
    let v: JsonValue =
        serde_json::from_str(&decoded).map_err(|e| LinkParseError::InvalidJson(e.to_string()))?;
    if !v.is_object() {
        return Err(LinkParseError::InvalidJson("expected an object".to_string()));
    }

    let server = non_empty(&v, "add").ok_or(LinkParseError::MissingField("add"))?;
    let port = json_u64(&v, "port", u64::from(DEFAULT_PORT))?;
    let port = u16::try_from(port).map_err(|_| LinkParseError::InvalidField {
        field: "port",
        value: port.to_string(),
    })?;
    let uuid = non_empty(&v, "id").unwrap_or_default();
    let alter_id = json_u64(&v, "aid", 0)?;

    let tls = match v.get("tls") {
        Some(value) => truthy(value) && !scalar(value).eq_ignore_ascii_case("none"),
        None => false,
    };
    let sni = non_empty(&v, "sni");
    let skip_cert_verify = tls && (flag(&v, "skip-cert-verify") || flag(&v, "insecure"));

    let common = CommonProxyOptions::builder(proxy_name, bracket_ipv6(&server), port)
        .udp(true)
        .tls(Some(tls))
        .skip_cert_verify(Some(skip_cert_verify))
        .servername(if tls { sni.clone() } else { None })
        .build();

    let mut proxy = VMessProxy::new(common, uuid);
    proxy.alter_id = u32::try_from(alter_id).unwrap_or(0);
    if let Some(cipher) = non_empty(&v, "scy") {
        proxy.cipher = cipher;
    }
    proxy.transport = vmess_transport(&v, sni);
    proxy.packet_encoding = non_empty(&v, "packet_encoding").or_else(|| non_empty(&v, "packet-encoding"));

    Ok(ProxyDescriptor::VMess(proxy))
}

fn vmess_transport(v: &JsonValue, sni: Option<String>) -> TransportOptions {
    let net = non_empty(v, "net").unwrap_or_else(|| "tcp".to_string());
    let fake_type = non_empty(v, "type").unwrap_or_else(|| net.clone());
    let path = string(v, "path");
    let host = non_empty(v, "host");

    let mut transport = TransportOptions::network(net.as_str());
    if net == "ws" {
        let host = host.or(sni).unwrap_or_default();
        transport.ws_opts = Some(WsOptions::new(path.unwrap_or_else(|| "/".to_string()), &host));
    } else if net == "http" || (net == "tcp" && fake_type == "http") {
        transport.network = Some("http".to_string());
        transport.http_opts = Some(HttpOptions::new(
            vec![path.unwrap_or_else(|| "/".to_string())],
            host.into_iter().collect(),
        ));
    } else if net == "grpc" {
        let service = path
            .filter(|p| !p.is_empty())
            .or_else(|| non_empty(v, "serviceName"))
            .unwrap_or_default();
        transport.grpc_opts = Some(GrpcOptions {
            grpc_service_name: service,
        });
    } else if net == "h2" {
        transport.h2_opts = Some(H2Options {
            path: vec![path.unwrap_or_else(|| "/".to_string())],
            host: host.map(|h| vec![h]),
        });
    }
    transport
}

/// Textual form of a JSON scalar; numbers and booleans are stringified.
fn scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn string(v: &JsonValue, key: &str) -> Option<String> {
    v.get(key).filter(|value| !value.is_null()).map(scalar)
}

fn non_empty(v: &JsonValue, key: &str) -> Option<String> {
    string(v, key).filter(|s| !s.trim().is_empty())
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

fn flag(v: &JsonValue, key: &str) -> bool {
    match v.get(key) {
        Some(JsonValue::String(s)) => parse_flag(s),
        Some(value) => truthy(value),
        None => false,
    }
}

/// Reads an integer that may be encoded as a number or a string.
fn json_u64(v: &JsonValue, key: &'static str, default: u64) -> Result<u64, LinkParseError> {
    let invalid = |value: &JsonValue| LinkParseError::InvalidField {
        field: key,
        value: scalar(value),
    };
    match v.get(key) {
        None | Some(JsonValue::Null) => Ok(default),
        Some(JsonValue::Number(n)) => n.as_u64().ok_or_else(|| invalid(&JsonValue::Number(n.clone()))),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(default),
        Some(value @ JsonValue::String(s)) => s.trim().parse().map_err(|_| invalid(value)),
        Some(value) => Err(invalid(value)),
    }
}
