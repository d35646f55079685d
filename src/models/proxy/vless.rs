use serde::Serialize;

use super::{is_empty_option_string, CommonProxyOptions, RealityOptions, TransportOptions};

/// VLESS proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VlessProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub uuid: String,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub packet_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOptions>,
    #[serde(flatten)]
    pub transport: TransportOptions,
}

impl VlessProxy {
    pub fn new(common: CommonProxyOptions, uuid: impl Into<String>) -> Self {
        VlessProxy {
            common,
            uuid: uuid.into(),
            flow: None,
            packet_encoding: None,
            reality_opts: None,
            transport: TransportOptions::network("tcp"),
        }
    }
}
