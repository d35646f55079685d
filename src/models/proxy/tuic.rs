use serde::Serialize;

use super::CommonProxyOptions;

/// TUIC v5 proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TuicProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub uuid: String,
    pub password: String,
    pub disable_sni: bool,
    pub congestion_controller: String,
    pub udp_relay_mode: String,
    pub reduce_rtt: bool,
    pub zero_rtt: bool,
}

impl TuicProxy {
    pub fn new(
        common: CommonProxyOptions,
        uuid: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        TuicProxy {
            common,
            uuid: uuid.into(),
            password: password.into(),
            disable_sni: false,
            congestion_controller: "bbr".to_string(),
            udp_relay_mode: "native".to_string(),
            reduce_rtt: false,
            zero_rtt: false,
        }
    }
}
