use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{NodeRecord, RoutingClass};

/// Node counts for a dashboard-style overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total: usize,
    pub direct: usize,
    pub relay: usize,
    pub unclassified: usize,
    /// Number of active links per protocol, keyed by display label.
    pub protocols: BTreeMap<String, usize>,
}

/// Display label of a links-map protocol key.
pub fn protocol_label(key: &str) -> String {
    let label = match key.to_ascii_lowercase().as_str() {
        "hy2" | "hysteria2" => "Hysteria2",
        "ss" | "shadowsocks" => "Shadowsocks",
        "vless" => "VLESS",
        "vmess" => "VMess",
        "trojan" => "Trojan",
        "tuic" => "TUIC",
        "socks5" => "Socks5",
        _ => return key.to_string(),
    };
    label.to_string()
}

pub fn inventory_stats(nodes: &[NodeRecord]) -> InventoryStats {
    let mut stats = InventoryStats {
        total: nodes.len(),
        ..Default::default()
    };
    for node in nodes {
        match node.routing_type {
            RoutingClass::Direct => stats.direct += 1,
            RoutingClass::Relay => stats.relay += 1,
            RoutingClass::Unclassified => stats.unclassified += 1,
        }
        for (protocol, _) in node.active_links() {
            *stats.protocols.entry(protocol_label(protocol)).or_insert(0) += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_label() {
        assert_eq!(protocol_label("hy2"), "Hysteria2");
        assert_eq!(protocol_label("SS"), "Shadowsocks");
        assert_eq!(protocol_label("wireguard"), "wireguard");
    }

    #[test]
    fn test_inventory_stats() {
        let mut a = NodeRecord::new_local("a", "vless", "vless://u@a:443");
        a.links.insert("hy2".to_string(), "hy2://p@a:443".to_string());
        a.links.insert("ss".to_string(), "  ".to_string());
        let b = NodeRecord::new_subscription("b", "hy2", "hy2://p@b:443", None);
        let mut c = NodeRecord::new_local("c", "trojan", "trojan://p@c:443");
        c.routing_type = RoutingClass::Direct;

        let stats = inventory_stats(&[a, b, c]);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.direct, stats.relay, stats.unclassified), (1, 1, 1));
        assert_eq!(stats.protocols.get("Hysteria2"), Some(&2));
        assert_eq!(stats.protocols.get("VLESS"), Some(&1));
        assert_eq!(stats.protocols.get("Trojan"), Some(&1));
        assert!(!stats.protocols.contains_key("Shadowsocks"));
    }
}
