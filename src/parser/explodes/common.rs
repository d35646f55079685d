use log::{debug, warn};

use crate::error::LinkParseError;
use crate::models::{ProxyDescriptor, ProxyType};
use crate::utils::address::{resolve_authority, ResolvedAuthority, DEFAULT_PORT};
use crate::utils::params::QueryParams;
use crate::utils::url::{split_fragment, url_decode};

/// Glyph used as the name prefix when a node has no region.
pub const DEFAULT_FLAG: &str = "🌐";

/// Structural view of a URL-style share link.
///
/// Built by hand instead of with a URL parser so that unbracketed IPv6 hosts
/// survive; the authority goes through [`resolve_authority`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts {
    pub scheme: String,
    pub authority: ResolvedAuthority,
    /// Raw userinfo before the first `:`.
    pub username: String,
    /// Raw userinfo after the first `:`, if any.
    pub password: Option<String>,
    pub params: QueryParams,
    pub fragment: Option<String>,
}

impl LinkParts {
    pub fn parse(link: &str) -> Result<Self, LinkParseError> {
        let (scheme, rest) = link
            .split_once("://")
            .ok_or_else(|| LinkParseError::UnsupportedScheme(String::new()))?;
        let (rest, fragment) = split_fragment(rest);
        let end = rest.find(&['/', '?'][..]).unwrap_or(rest.len());
        let (netloc, tail) = rest.split_at(end);
        let query = tail.split_once('?').map_or("", |(_, query)| query);

        let authority = resolve_authority(netloc, DEFAULT_PORT);
        let (username, password) = match authority.userinfo.split_once(':') {
            Some((user, pass)) => (user.to_string(), Some(pass.to_string())),
            None => (authority.userinfo.clone(), None),
        };

        Ok(LinkParts {
            scheme: scheme.to_ascii_lowercase(),
            authority,
            username,
            password,
            params: QueryParams::parse(query),
            fragment: fragment.map(str::to_string),
        })
    }

    /// Server host, which every descriptor requires.
    pub fn server(&self) -> Result<&str, LinkParseError> {
        if self.authority.server.is_empty() {
            Err(LinkParseError::MissingField("server"))
        } else {
            Ok(&self.authority.server)
        }
    }

    pub fn port(&self) -> u16 {
        self.authority.port
    }

    /// Percent-decoded userinfo, falling back to the username and password.
    pub fn credential(&self) -> String {
        if !self.authority.userinfo.is_empty() {
            return url_decode(&self.authority.userinfo);
        }
        if !self.username.is_empty() {
            return url_decode(&self.username);
        }
        self.password
            .as_deref()
            .map(url_decode)
            .unwrap_or_default()
    }
}

/// Flag prefix for a region code: the trimmed code, or the globe glyph.
pub fn emoji_flag(region: Option<&str>) -> &str {
    match region.map(str::trim) {
        Some(region) if !region.is_empty() => region,
        _ => DEFAULT_FLAG,
    }
}

/// Builds `"<flag> <base name>"`, dropping any copy of the flag already in
/// the base name.
pub fn build_proxy_name(base_name: &str, region: Option<&str>) -> String {
    let flag = emoji_flag(region);
    let clean_name = base_name.replace(flag, "");
    format!("{} {}", flag, clean_name.trim())
}

/// Parses a share link into a descriptor, reporting why it failed.
pub fn parse_link(
    link: &str,
    base_name: &str,
    region: Option<&str>,
) -> Result<ProxyDescriptor, LinkParseError> {
    let link = link.trim();
    let proxy_name = build_proxy_name(base_name, region);

    let scheme = link
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| LinkParseError::UnsupportedScheme(String::new()))?;
    let proxy_type = ProxyType::from_scheme(scheme)
        .ok_or_else(|| LinkParseError::UnsupportedScheme(scheme.to_ascii_lowercase()))?;

    if proxy_type == ProxyType::VMess {
        return super::vmess::explode_vmess(link, &proxy_name);
    }

    let parts = LinkParts::parse(link)?;
    match proxy_type {
        ProxyType::Vless => super::vless::explode_vless(&parts, &proxy_name),
        ProxyType::Trojan => super::trojan::explode_trojan(&parts, &proxy_name),
        ProxyType::Hysteria2 => super::hysteria2::explode_hysteria2(&parts, &proxy_name),
        ProxyType::Tuic => super::tuic::explode_tuic(&parts, &proxy_name),
        ProxyType::Shadowsocks => super::ss::explode_ss(link, &parts.params, &proxy_name),
        ProxyType::VMess => super::vmess::explode_vmess(link, &proxy_name),
    }
}

/// Parses a share link, logging and swallowing any failure.
///
/// Malformed links never abort a batch; callers simply skip `None`.
pub fn explode_link(link: &str, base_name: &str, region: Option<&str>) -> Option<ProxyDescriptor> {
    match parse_link(link, base_name, region) {
        Ok(proxy) => Some(proxy),
        Err(LinkParseError::UnsupportedScheme(scheme)) => {
            debug!("Skipping link with unsupported scheme '{}'", scheme);
            None
        }
        Err(e) => {
            let preview: String = link.trim().chars().take(30).collect();
            warn!("Link parse error [{}...]: {}", preview, e);
            None
        }
    }
}
