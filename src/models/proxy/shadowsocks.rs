use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{is_empty_option_string, CommonProxyOptions};

/// Shadowsocks proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShadowsocksProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    pub cipher: String,
    pub password: String,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub plugin: Option<String>,
    /// Free-form plugin options; only emitted together with `plugin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<JsonValue>,
}

impl ShadowsocksProxy {
    pub fn new(
        common: CommonProxyOptions,
        cipher: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ShadowsocksProxy {
            common,
            cipher: cipher.into(),
            password: password.into(),
            plugin: None,
            plugin_opts: None,
        }
    }
}
