use serde::Serialize;

use super::is_empty_option_string;

/// Fields shared by every proxy type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonProxyOptions {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub udp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub client_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn: Option<Vec<String>>,
}

impl CommonProxyOptions {
    pub fn builder(
        name: impl Into<String>,
        server: impl Into<String>,
        port: u16,
    ) -> CommonProxyOptionsBuilder {
        CommonProxyOptionsBuilder {
            options: CommonProxyOptions {
                name: name.into(),
                server: server.into(),
                port,
                udp: false,
                tfo: None,
                tls: None,
                skip_cert_verify: None,
                sni: None,
                servername: None,
                client_fingerprint: None,
                alpn: None,
            },
        }
    }
}

/// Builder for [`CommonProxyOptions`]
pub struct CommonProxyOptionsBuilder {
    options: CommonProxyOptions,
}

impl CommonProxyOptionsBuilder {
    pub fn udp(mut self, udp: bool) -> Self {
        self.options.udp = udp;
        self
    }

    pub fn tfo(mut self, tfo: Option<bool>) -> Self {
        self.options.tfo = tfo;
        self
    }

    pub fn tls(mut self, tls: Option<bool>) -> Self {
        self.options.tls = tls;
        self
    }

    pub fn skip_cert_verify(mut self, skip: Option<bool>) -> Self {
        self.options.skip_cert_verify = skip;
        self
    }

    pub fn sni(mut self, sni: Option<String>) -> Self {
        self.options.sni = sni;
        self
    }

    pub fn servername(mut self, servername: Option<String>) -> Self {
        self.options.servername = servername;
        self
    }

    pub fn client_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.options.client_fingerprint = fingerprint;
        self
    }

    pub fn alpn(mut self, alpn: Option<Vec<String>>) -> Self {
        self.options.alpn = alpn;
        self
    }

    pub fn build(self) -> CommonProxyOptions {
        self.options
    }
}
