//! Inventory node records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sort position given to nodes that were never explicitly ordered.
pub const DEFAULT_SORT_INDEX: i64 = 99999;

/// Region shown for store nodes that carry none.
pub const DEFAULT_STORE_REGION: &str = "DB";

/// Which artifact list a node belongs to.
///
/// Stored on disk as the integer codes `0` (direct), `1` (relay) and `-1`
/// (unclassified). Any other code, or `null`, reads as unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoutingClass {
    Direct,
    Relay,
    #[default]
    Unclassified,
}

impl RoutingClass {
    pub fn code(self) -> i32 {
        match self {
            RoutingClass::Direct => 0,
            RoutingClass::Relay => 1,
            RoutingClass::Unclassified => -1,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RoutingClass::Direct,
            1 => RoutingClass::Relay,
            _ => RoutingClass::Unclassified,
        }
    }

    pub fn is_classified(self) -> bool {
        self != RoutingClass::Unclassified
    }
}

impl Serialize for RoutingClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for RoutingClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = Option::<i64>::deserialize(deserializer)?;
        Ok(code.map_or(RoutingClass::Unclassified, RoutingClass::from_code))
    }
}

/// Where a node came from.
///
/// Serialized as `db`, `local` and `sub`. Unrecognized tags survive a load as
/// [`Origin::Unknown`] so reconciliation can normalize them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// Mirror of a node owned by the authoritative store.
    Store,
    #[default]
    Local,
    Subscription,
    Unknown(String),
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Store => "db",
            Origin::Local => "local",
            Origin::Subscription => "sub",
            Origin::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match tag.as_str() {
            "db" => Origin::Store,
            "local" => Origin::Local,
            "sub" => Origin::Subscription,
            _ => Origin::Unknown(tag),
        })
    }
}

fn default_sort_index() -> i64 {
    DEFAULT_SORT_INDEX
}

/// One entry of the working inventory (`nodes.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "uuid")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Share links keyed by protocol (`vless`, `hy2`, `ss`, ...).
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    #[serde(default)]
    pub routing_type: RoutingClass,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default = "default_sort_index")]
    pub sort_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_source_id: Option<String>,
}

impl NodeRecord {
    /// A user-entered node holding a single link.
    pub fn new_local(name: impl Into<String>, protocol: &str, link: impl Into<String>) -> Self {
        NodeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            region: None,
            links: BTreeMap::from([(protocol.to_string(), link.into())]),
            routing_type: RoutingClass::Relay,
            origin: Origin::Local,
            is_fixed: false,
            sort_index: DEFAULT_SORT_INDEX,
            sub_source_id: None,
        }
    }

    /// A node imported from a subscription feed.
    pub fn new_subscription(
        name: impl Into<String>,
        protocol: &str,
        link: impl Into<String>,
        source_id: Option<String>,
    ) -> Self {
        NodeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            region: None,
            links: BTreeMap::from([(protocol.to_string(), link.into())]),
            routing_type: RoutingClass::Unclassified,
            origin: Origin::Subscription,
            is_fixed: false,
            sort_index: DEFAULT_SORT_INDEX,
            sub_source_id: source_id,
        }
    }

    /// A mirror of a store node, keeping the store's id.
    pub fn mirror_of(store: &StoreNode) -> Self {
        NodeRecord {
            id: store.uuid.clone(),
            name: store.display_name().to_string(),
            region: Some(store.region_or_default().to_string()),
            links: store.links.clone(),
            routing_type: store.routing_class(),
            origin: Origin::Store,
            is_fixed: false,
            sort_index: DEFAULT_SORT_INDEX,
            sub_source_id: None,
        }
    }

    /// Links with non-blank values, in protocol order.
    pub fn active_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links
            .iter()
            .map(|(proto, link)| (proto.as_str(), link.trim()))
            .filter(|(_, link)| !link.is_empty())
    }
}

/// A node as held by the authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreNode {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_type: Option<i64>,
}

impl StoreNode {
    /// The custom name when set, otherwise the store name.
    pub fn display_name(&self) -> &str {
        match self.custom_name.as_deref() {
            Some(custom) if !custom.is_empty() => custom,
            _ => &self.name,
        }
    }

    pub fn region_or_default(&self) -> &str {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => region,
            _ => DEFAULT_STORE_REGION,
        }
    }

    pub fn routing_class(&self) -> RoutingClass {
        self.routing_type
            .map_or(RoutingClass::Unclassified, RoutingClass::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_record_defaults_on_load() {
        let node: NodeRecord = serde_json::from_str(r#"{"uuid":"a","name":"n"}"#).unwrap();
        assert_eq!(node.routing_type, RoutingClass::Unclassified);
        assert_eq!(node.origin, Origin::Local);
        assert_eq!(node.sort_index, DEFAULT_SORT_INDEX);
        assert!(!node.is_fixed);
    }

    #[test]
    fn test_node_record_wire_names() {
        let node: NodeRecord = serde_json::from_str(
            r#"{"uuid":"a","name":"n","routing_type":0,"origin":"sub","sub_source_id":"s1",
                "links":{"vless":"vless://x@h:1"},"sort_index":3}"#,
        )
        .unwrap();
        assert_eq!(node.routing_type, RoutingClass::Direct);
        assert_eq!(node.origin, Origin::Subscription);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["uuid"], "a");
        assert_eq!(value["routing_type"], 0);
        assert_eq!(value["origin"], "sub");
        assert!(value.get("region").is_none());
    }

    #[test]
    fn test_unknown_origin_and_codes() {
        let node: NodeRecord =
            serde_json::from_str(r#"{"uuid":"a","origin":"manual","routing_type":7}"#).unwrap();
        assert_eq!(node.origin, Origin::Unknown("manual".to_string()));
        assert_eq!(node.routing_type, RoutingClass::Unclassified);

        let node: NodeRecord =
            serde_json::from_str(r#"{"uuid":"a","routing_type":null}"#).unwrap();
        assert_eq!(node.routing_type, RoutingClass::Unclassified);
    }

    #[test]
    fn test_store_node_names() {
        let store: StoreNode = serde_json::from_str(
            r#"{"uuid":"s","name":"tokyo-1","custom_name":"Tokyo","routing_type":1}"#,
        )
        .unwrap();
        assert_eq!(store.display_name(), "Tokyo");
        assert_eq!(store.region_or_default(), "DB");

        let mirror = NodeRecord::mirror_of(&store);
        assert_eq!(mirror.id, "s");
        assert_eq!(mirror.name, "Tokyo");
        assert_eq!(mirror.routing_type, RoutingClass::Relay);
        assert_eq!(mirror.origin, Origin::Store);
        assert!(!mirror.is_fixed);
    }

    #[test]
    fn test_active_links_skip_blank() {
        let mut node = NodeRecord::new_local("n", "vless", "vless://a@b:1");
        node.links.insert("ss".to_string(), "  ".to_string());
        let links: Vec<_> = node.active_links().collect();
        assert_eq!(links, vec![("vless", "vless://a@b:1")]);
    }
}
