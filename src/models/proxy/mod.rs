//! Proxy descriptor definitions
//!
//! A [`ProxyDescriptor`] is the canonical form of one parsed share link. It
//! serializes to the Clash Meta proxy schema, which is what the partitioned
//! proxy lists are made of.

mod common;
mod hysteria2;
mod shadowsocks;
mod transport;
mod trojan;
mod tuic;
mod vless;
mod vmess;

use std::fmt;

use serde::Serialize;

pub use common::{CommonProxyOptions, CommonProxyOptionsBuilder};
pub use hysteria2::Hysteria2Proxy;
pub use shadowsocks::ShadowsocksProxy;
pub use transport::{GrpcOptions, H2Options, HttpOptions, RealityOptions, TransportOptions, WsOptions};
pub use trojan::TrojanProxy;
pub use tuic::TuicProxy;
pub use vless::VlessProxy;
pub use vmess::VMessProxy;

pub(crate) fn is_empty_option_string(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, str::is_empty)
}

/// Protocol families the link parsers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProxyType {
    VMess,
    Vless,
    Trojan,
    Hysteria2,
    Tuic,
    Shadowsocks,
}

impl ProxyType {
    /// Maps a link scheme (case-insensitive) to its protocol.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "vmess" => Some(ProxyType::VMess),
            "vless" => Some(ProxyType::Vless),
            "trojan" => Some(ProxyType::Trojan),
            "hysteria2" | "hy2" => Some(ProxyType::Hysteria2),
            "tuic" => Some(ProxyType::Tuic),
            "ss" | "shadowsocks" => Some(ProxyType::Shadowsocks),
            _ => None,
        }
    }

    /// Key used for this protocol in a node's `links` map.
    pub fn link_key(self) -> &'static str {
        match self {
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria2 => "hy2",
            ProxyType::Tuic => "tuic",
            ProxyType::Shadowsocks => "ss",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProxyType::VMess => "VMess",
            ProxyType::Vless => "VLESS",
            ProxyType::Trojan => "Trojan",
            ProxyType::Hysteria2 => "Hysteria2",
            ProxyType::Tuic => "TUIC",
            ProxyType::Shadowsocks => "Shadowsocks",
        };
        f.write_str(name)
    }
}

/// One proxy endpoint, tagged by protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProxyDescriptor {
    #[serde(rename = "vmess")]
    VMess(VMessProxy),
    #[serde(rename = "vless")]
    Vless(VlessProxy),
    #[serde(rename = "trojan")]
    Trojan(TrojanProxy),
    #[serde(rename = "hysteria2")]
    Hysteria2(Hysteria2Proxy),
    #[serde(rename = "tuic")]
    Tuic(TuicProxy),
    #[serde(rename = "ss")]
    Shadowsocks(ShadowsocksProxy),
}

impl ProxyDescriptor {
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            ProxyDescriptor::VMess(_) => ProxyType::VMess,
            ProxyDescriptor::Vless(_) => ProxyType::Vless,
            ProxyDescriptor::Trojan(_) => ProxyType::Trojan,
            ProxyDescriptor::Hysteria2(_) => ProxyType::Hysteria2,
            ProxyDescriptor::Tuic(_) => ProxyType::Tuic,
            ProxyDescriptor::Shadowsocks(_) => ProxyType::Shadowsocks,
        }
    }

    pub fn common(&self) -> &CommonProxyOptions {
        match self {
            ProxyDescriptor::VMess(p) => &p.common,
            ProxyDescriptor::Vless(p) => &p.common,
            ProxyDescriptor::Trojan(p) => &p.common,
            ProxyDescriptor::Hysteria2(p) => &p.common,
            ProxyDescriptor::Tuic(p) => &p.common,
            ProxyDescriptor::Shadowsocks(p) => &p.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut CommonProxyOptions {
        match self {
            ProxyDescriptor::VMess(p) => &mut p.common,
            ProxyDescriptor::Vless(p) => &mut p.common,
            ProxyDescriptor::Trojan(p) => &mut p.common,
            ProxyDescriptor::Hysteria2(p) => &mut p.common,
            ProxyDescriptor::Tuic(p) => &mut p.common,
            ProxyDescriptor::Shadowsocks(p) => &mut p.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.common_mut().name = name.into();
    }

    pub fn server(&self) -> &str {
        &self.common().server
    }

    pub fn port(&self) -> u16 {
        self.common().port
    }

    /// The user id or password that authenticates against the endpoint.
    pub fn credential(&self) -> &str {
        match self {
            ProxyDescriptor::VMess(p) => &p.uuid,
            ProxyDescriptor::Vless(p) => &p.uuid,
            ProxyDescriptor::Trojan(p) => &p.password,
            ProxyDescriptor::Hysteria2(p) => &p.password,
            ProxyDescriptor::Tuic(p) => &p.uuid,
            ProxyDescriptor::Shadowsocks(p) => &p.password,
        }
    }
}
