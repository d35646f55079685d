use serde::Serialize;

use super::{is_empty_option_string, CommonProxyOptions, TransportOptions};

/// VMess proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VMessProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub uuid: String,
    #[serde(rename = "alterId")]
    pub alter_id: u32,
    pub cipher: String,
    #[serde(flatten)]
    pub transport: TransportOptions,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub packet_encoding: Option<String>,
}

impl VMessProxy {
    pub fn new(common: CommonProxyOptions, uuid: impl Into<String>) -> Self {
        VMessProxy {
            common,
            uuid: uuid.into(),
            alter_id: 0,
            cipher: "auto".to_string(),
            transport: TransportOptions::network("tcp"),
            packet_encoding: None,
        }
    }
}
