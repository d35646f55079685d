use serde::Serialize;

use super::{CommonProxyOptions, RealityOptions, TransportOptions};

/// Trojan proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrojanProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOptions>,
    #[serde(flatten)]
    pub transport: TransportOptions,
}

impl TrojanProxy {
    pub fn new(common: CommonProxyOptions, password: impl Into<String>) -> Self {
        TrojanProxy {
            common,
            password: password.into(),
            reality_opts: None,
            transport: TransportOptions::network("tcp"),
        }
    }
}
