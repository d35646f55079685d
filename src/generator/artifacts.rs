//! Partitioned proxy lists and the combined link bundle.

use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::error::PersistenceError;
use crate::models::{NodeRecord, Origin, ProxyDescriptor, RoutingClass};
use crate::parser::explodes::{emoji_flag, explode_link};
use crate::utils::address::fix_link_ipv6;
use crate::utils::base64::base64_encode;
use crate::utils::file::write_atomic;
use crate::utils::url::{split_fragment, url_encode};

/// Glyph prefixed to the labels of hand-entered nodes.
pub const LOCAL_FLAG: &str = "📝";

pub const DIRECT_LIST_FILE: &str = "0.yaml";
pub const RELAY_LIST_FILE: &str = "1.yaml";
pub const BUNDLE_FILE: &str = "bundle.txt";
pub const BUNDLE_BASE64_FILE: &str = "bundle.b64";

/// Everything regenerated from one inventory snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    pub direct: Vec<ProxyDescriptor>,
    pub relay: Vec<ProxyDescriptor>,
    /// One share link per line, labelled through its fragment.
    pub bundle: Vec<String>,
}

#[derive(Serialize)]
struct ProxyList<'a> {
    proxies: &'a [ProxyDescriptor],
}

impl Artifacts {
    /// Descriptors of one partition. Unclassified nodes have none.
    pub fn proxies(&self, class: RoutingClass) -> &[ProxyDescriptor] {
        match class {
            RoutingClass::Direct => &self.direct,
            RoutingClass::Relay => &self.relay,
            RoutingClass::Unclassified => &[],
        }
    }

    /// Renders a partition as a `proxies:` YAML document.
    pub fn proxy_list_yaml(&self, class: RoutingClass) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&ProxyList {
            proxies: self.proxies(class),
        })
    }

    pub fn bundle_text(&self) -> String {
        self.bundle.join("\n")
    }

    pub fn bundle_base64(&self) -> String {
        base64_encode(&self.bundle_text())
    }
}

/// Final display label of one protocol link of a node.
pub fn node_label(node: &NodeRecord, protocol: &str) -> String {
    let label = match &node.origin {
        Origin::Store => format!(
            "{} {}-{}",
            emoji_flag(node.region.as_deref()),
            protocol,
            node.name
        ),
        Origin::Subscription => node.name.clone(),
        Origin::Local | Origin::Unknown(_) => format!("{} {}-{}", LOCAL_FLAG, protocol, node.name),
    };
    label.trim().to_string()
}

fn in_bundle(node: &NodeRecord) -> bool {
    node.routing_type.is_classified() || node.origin == Origin::Subscription
}

/// Share link with its authority normalized and its fragment replaced by
/// the label.
fn bundle_line(link: &str, label: &str) -> String {
    let fixed = fix_link_ipv6(link);
    let (body, _) = split_fragment(&fixed);
    format!("{}#{}", body, url_encode(label))
}

/// Builds the artifacts for `nodes`.
///
/// Nodes are taken in ascending `sort_index` order, ties keeping their input
/// order, and each node's links in protocol-key order. Links that fail to
/// parse are left out of the proxy lists but still appear in the bundle.
pub fn render(nodes: &[NodeRecord]) -> Artifacts {
    let mut ordered: Vec<&NodeRecord> = nodes.iter().collect();
    ordered.sort_by_key(|node| node.sort_index);

    let mut artifacts = Artifacts::default();
    for node in ordered {
        let mut bucket = match node.routing_type {
            RoutingClass::Direct => Some(&mut artifacts.direct),
            RoutingClass::Relay => Some(&mut artifacts.relay),
            RoutingClass::Unclassified => None,
        };
        let include_in_bundle = in_bundle(node);
        if bucket.is_none() && !include_in_bundle {
            continue;
        }

        for (protocol, link) in node.active_links() {
            let label = node_label(node, protocol);
            if let Some(list) = bucket.as_deref_mut() {
                match explode_link(link, &label, node.region.as_deref()) {
                    Some(mut proxy) => {
                        proxy.set_name(label.clone());
                        list.push(proxy);
                    }
                    None => debug!("Node '{}' has an unusable {} link", node.name, protocol),
                }
            }
            if include_in_bundle {
                artifacts.bundle.push(bundle_line(link, &label));
            }
        }
    }
    artifacts
}

/// Writes the proxy lists and the bundle into `dir`, each file atomically.
pub fn write_artifacts(
    dir: &Path,
    artifacts: &Artifacts,
    include_base64: bool,
) -> Result<(), PersistenceError> {
    let direct = artifacts.proxy_list_yaml(RoutingClass::Direct)?;
    let relay = artifacts.proxy_list_yaml(RoutingClass::Relay)?;
    let bundle = artifacts.bundle_text();

    write_atomic(&dir.join(DIRECT_LIST_FILE), direct.as_bytes())?;
    write_atomic(&dir.join(RELAY_LIST_FILE), relay.as_bytes())?;
    write_atomic(&dir.join(BUNDLE_FILE), bundle.as_bytes())?;
    if include_base64 {
        write_atomic(&dir.join(BUNDLE_BASE64_FILE), artifacts.bundle_base64().as_bytes())?;
    }

    info!(
        "Artifacts written to {}: {} direct, {} relay, {} bundle links",
        dir.display(),
        artifacts.direct.len(),
        artifacts.relay.len(),
        artifacts.bundle.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn node(name: &str, origin: Origin, routing: RoutingClass, sort_index: i64) -> NodeRecord {
        NodeRecord {
            id: format!("id-{}", name),
            name: name.to_string(),
            region: None,
            links: BTreeMap::new(),
            routing_type: routing,
            origin,
            is_fixed: false,
            sort_index,
            sub_source_id: None,
        }
    }

    #[test]
    fn test_node_label() {
        let mut store = node("Tokyo", Origin::Store, RoutingClass::Direct, 0);
        store.region = Some("🇯🇵".to_string());
        assert_eq!(node_label(&store, "vless"), "🇯🇵 vless-Tokyo");

        let local = node("Home", Origin::Local, RoutingClass::Relay, 0);
        assert_eq!(node_label(&local, "hy2"), "📝 hy2-Home");

        let sub = node(" HK 01 ", Origin::Subscription, RoutingClass::Unclassified, 0);
        assert_eq!(node_label(&sub, "trojan"), "HK 01");
    }

    #[test]
    fn test_render_partitions_and_bundle() {
        let mut direct = node("A", Origin::Local, RoutingClass::Direct, 2);
        direct
            .links
            .insert("trojan".to_string(), "trojan://pw@a.example.com:443#old".to_string());
        let mut relay = node("B", Origin::Local, RoutingClass::Relay, 1);
        relay
            .links
            .insert("hy2".to_string(), "hy2://pw@2001:db8::1:8443".to_string());
        let mut fresh = node("C", Origin::Subscription, RoutingClass::Unclassified, 0);
        fresh
            .links
            .insert("tuic".to_string(), "tuic://u:p@c.example.com:443".to_string());
        let mut hidden = node("D", Origin::Local, RoutingClass::Unclassified, 0);
        hidden
            .links
            .insert("trojan".to_string(), "trojan://pw@d.example.com:443".to_string());

        let artifacts = render(&[direct, relay, fresh, hidden]);
        assert_eq!(artifacts.direct.len(), 1);
        assert_eq!(artifacts.direct[0].name(), "📝 trojan-A");
        assert_eq!(artifacts.relay.len(), 1);
        assert_eq!(artifacts.relay[0].server(), "[2001:db8::1]");
        assert_eq!(
            artifacts.bundle,
            vec![
                "tuic://u:p@c.example.com:443#C".to_string(),
                "hy2://pw@[2001:db8::1]:8443#%F0%9F%93%9D%20hy2-B".to_string(),
                "trojan://pw@a.example.com:443#%F0%9F%93%9D%20trojan-A".to_string(),
            ]
        );
        assert!(artifacts.proxies(RoutingClass::Unclassified).is_empty());
    }

    #[test]
    fn test_broken_link_stays_in_bundle() {
        let mut broken = node("X", Origin::Local, RoutingClass::Relay, 0);
        broken
            .links
            .insert("vmess".to_string(), "vmess://not-base64!!".to_string());
        let artifacts = render(&[broken]);
        assert!(artifacts.relay.is_empty());
        assert_eq!(artifacts.bundle.len(), 1);
    }

    #[test]
    fn test_proxy_list_yaml() {
        let mut relay = node("B", Origin::Local, RoutingClass::Relay, 0);
        relay
            .links
            .insert("ss".to_string(), "ss://YWVzLTI1Ni1nY206cGFzcw==@example.com:8388".to_string());
        let artifacts = render(&[relay]);
        let yaml = artifacts.proxy_list_yaml(RoutingClass::Relay).unwrap();
        assert!(yaml.starts_with("proxies:\n"));
        assert!(yaml.contains("type: ss"));
        assert!(yaml.contains("cipher: aes-256-gcm"));
        assert!(yaml.contains("ss-B"));

        let empty = artifacts.proxy_list_yaml(RoutingClass::Direct).unwrap();
        assert_eq!(empty.trim(), "proxies: []");
    }

    #[test]
    fn test_write_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut relay = node("B", Origin::Local, RoutingClass::Relay, 0);
        relay
            .links
            .insert("trojan".to_string(), "trojan://pw@b.example.com:443".to_string());
        let artifacts = render(&[relay]);
        write_artifacts(dir.path(), &artifacts, true).unwrap();

        for file in [DIRECT_LIST_FILE, RELAY_LIST_FILE, BUNDLE_FILE, BUNDLE_BASE64_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
        let b64 = std::fs::read_to_string(dir.path().join(BUNDLE_BASE64_FILE)).unwrap();
        assert_eq!(b64, artifacts.bundle_base64());
    }
}
