use serde::Serialize;

use super::{is_empty_option_string, CommonProxyOptions};

/// Hysteria2 proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hysteria2Proxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub password: String,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub obfs: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub obfs_password: Option<String>,
    /// Upload bandwidth in Mbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<u32>,
    /// Download bandwidth in Mbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<u32>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub ports: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hop_interval: Option<u32>,
}

impl Hysteria2Proxy {
    pub fn new(common: CommonProxyOptions, password: impl Into<String>) -> Self {
        Hysteria2Proxy {
            common,
            password: password.into(),
            obfs: None,
            obfs_password: None,
            up: None,
            down: None,
            ports: None,
            hop_interval: None,
        }
    }
}
