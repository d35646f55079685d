use std::collections::BTreeMap;

use serde::Serialize;

/// Stream transport of a VMess, VLESS or Trojan proxy.
///
/// At most one of the `*_opts` blocks is set, matching `network`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransportOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_opts: Option<HttpOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_opts: Option<H2Options>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOptions>,
}

impl TransportOptions {
    pub fn network(network: impl Into<String>) -> Self {
        TransportOptions {
            network: Some(network.into()),
            ..Default::default()
        }
    }

    pub fn network_name(&self) -> &str {
        self.network.as_deref().unwrap_or("tcp")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WsOptions {
    pub path: String,
    pub headers: BTreeMap<String, String>,
}

impl WsOptions {
    /// Options with the `Host` header set when `host` is non-empty.
    pub fn new(path: impl Into<String>, host: &str) -> Self {
        let mut headers = BTreeMap::new();
        if !host.is_empty() {
            headers.insert("Host".to_string(), host.to_string());
        }
        WsOptions {
            path: path.into(),
            headers,
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.headers.get("Host").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpOptions {
    pub method: String,
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, Vec<String>>>,
}

impl HttpOptions {
    pub fn new(path: Vec<String>, hosts: Vec<String>) -> Self {
        let headers = if hosts.is_empty() {
            None
        } else {
            Some(BTreeMap::from([("Host".to_string(), hosts)]))
        };
        HttpOptions {
            method: "GET".to_string(),
            path,
            headers,
        }
    }

    pub fn hosts(&self) -> &[String] {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get("Host"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct H2Options {
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOptions {
    pub grpc_service_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOptions {
    pub public_key: String,
    pub short_id: String,
}
