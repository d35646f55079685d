use std::collections::BTreeMap;
use std::sync::Arc;

use subsync::error::{ManageError, TransportError};
use subsync::inventory::{
    add_callback_link, add_local_link, clear_subscription_nodes, delete_node, delete_protocol,
    regenerate_artifacts, rename_node, update_links, update_routing, LinksChange, RoutingGroups,
};
use subsync::models::{NodeRecord, Origin, RoutingClass, StoreNode};
use subsync::store::{
    FileNodeStore, JsonEntryFile, JsonNodeFile, LocalNodeRepository, NodeStore,
};
use subsync::utils::file::write_json;
use subsync::utils::http::FeedFetcher;
use subsync::{AppContext, Settings};

/// Fetcher for contexts that never sync.
struct NoFeeds;

impl FeedFetcher for NoFeeds {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        Err(TransportError::Request(format!("unexpected fetch of {}", url)))
    }
}

struct Fixture {
    ctx: AppContext<NoFeeds>,
    dir: tempfile::TempDir,
}

impl Fixture {
    fn nodes(&self) -> Vec<NodeRecord> {
        self.ctx.local.load().unwrap()
    }

    fn node(&self, name: &str) -> NodeRecord {
        self.nodes()
            .into_iter()
            .find(|node| node.name == name)
            .unwrap_or_else(|| panic!("no node named {}", name))
    }

    fn read_output(&self, file: &str) -> String {
        std::fs::read_to_string(self.ctx.settings.output_dir().join(file)).unwrap()
    }
}

fn store_node(uuid: &str, name: &str, routing: i64) -> StoreNode {
    StoreNode {
        uuid: uuid.to_string(),
        name: name.to_string(),
        custom_name: None,
        region: Some("🇸🇬".to_string()),
        links: BTreeMap::from([(
            "hy2".to_string(),
            format!("hy2://pw@{}.example.com:443", name),
        )]),
        routing_type: Some(routing),
    }
}

fn fixture(store: Vec<StoreNode>, local: Vec<NodeRecord>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.common.data_dir = dir.path().display().to_string();
    write_json(&settings.store_nodes_path(), &store).unwrap();
    write_json(&settings.local_nodes_path(), &local).unwrap();

    let ctx = AppContext::new(
        settings.clone(),
        Arc::new(FileNodeStore::new(settings.store_nodes_path())),
        Arc::new(JsonNodeFile::new(settings.local_nodes_path())),
        Arc::new(JsonEntryFile::new(settings.subscriptions_path())),
        NoFeeds,
    );
    Fixture { ctx, dir }
}

#[cfg(test)]
mod manage_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_local_link_creates_then_merges() {
        let fx = fixture(Vec::new(), Vec::new());
        let created = add_local_link(&fx.ctx, "Home", None, "trojan://pw@home.example.com:443")
            .await
            .unwrap();
        assert!(!created.merged);

        let merged = add_local_link(&fx.ctx, "Home", None, "hy2://pw@home.example.com:443")
            .await
            .unwrap();
        assert!(merged.merged);
        assert_eq!(merged.id, created.id);

        let home = fx.node("Home");
        assert_eq!(home.origin, Origin::Local);
        assert_eq!(home.routing_type, RoutingClass::Relay);
        assert_eq!(home.links.keys().collect::<Vec<_>>(), vec!["hy2", "trojan"]);
        assert!(fx.read_output("1.yaml").contains("hy2-Home"));
    }

    #[tokio::test]
    async fn test_add_link_rejects_bad_input() {
        let fx = fixture(Vec::new(), Vec::new());
        let err = add_local_link(&fx.ctx, " ", None, "trojan://pw@h:443").await;
        assert!(matches!(err, Err(ManageError::MissingField("name"))));

        let err = add_local_link(&fx.ctx, "n", None, "vmess://garbage").await;
        assert!(matches!(err, Err(ManageError::InvalidLink(_))));
        assert!(fx.nodes().is_empty());
    }

    #[tokio::test]
    async fn test_callback_only_merges_local_nodes() {
        let sub = NodeRecord::new_subscription("Edge", "trojan", "trojan://pw@e:443", None);
        let fx = fixture(Vec::new(), vec![sub.clone()]);

        let added = add_callback_link(&fx.ctx, "Edge", Some("tuic"), "tuic://u:p@e:443")
            .await
            .unwrap();
        assert!(!added.merged);
        assert_eq!(fx.nodes().len(), 2);

        let added = add_local_link(&fx.ctx, "Edge", None, "vless://u@e:443").await.unwrap();
        assert!(added.merged);
        assert_eq!(added.id, sub.id);
    }

    #[tokio::test]
    async fn test_store_nodes_are_read_only() {
        let fx = fixture(vec![store_node("s1", "sg", 1)], Vec::new());
        regenerate_artifacts(&fx.ctx).await.unwrap();

        let err = delete_node(&fx.ctx, "s1").await;
        assert!(matches!(err, Err(ManageError::ReadOnly(_))));
        let err = update_links(&fx.ctx, "s1", BTreeMap::new()).await;
        assert!(matches!(err, Err(ManageError::ReadOnly(_))));
        let err = delete_protocol(&fx.ctx, "s1", "hy2").await;
        assert!(matches!(err, Err(ManageError::ReadOnly(_))));
        let err = delete_node(&fx.ctx, "missing").await;
        assert!(matches!(err, Err(ManageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rename_store_node_goes_through_store() {
        let fx = fixture(vec![store_node("s1", "sg", 1)], Vec::new());
        regenerate_artifacts(&fx.ctx).await.unwrap();

        rename_node(&fx.ctx, "s1", "Singapore").await.unwrap();
        let store = fx.ctx.store.list_nodes().unwrap();
        assert_eq!(store[0].custom_name.as_deref(), Some("Singapore"));
        assert_eq!(fx.node("Singapore").origin, Origin::Store);
        assert!(fx.read_output("1.yaml").contains("hy2-Singapore"));
    }

    #[tokio::test]
    async fn test_update_links_and_delete_protocol() {
        let mut node = NodeRecord::new_local("Box", "trojan", "trojan://pw@b:443");
        node.links.insert("hy2".to_string(), "hy2://pw@b:443".to_string());
        let id = node.id.clone();
        let fx = fixture(Vec::new(), vec![node]);

        let change = delete_protocol(&fx.ctx, &id, "hy2").await.unwrap();
        assert_eq!(change, LinksChange::Updated);
        let err = delete_protocol(&fx.ctx, &id, "hy2").await;
        assert!(matches!(err, Err(ManageError::NotFound(_))));

        let links = BTreeMap::from([
            ("trojan".to_string(), "trojan://new@b:443".to_string()),
            ("ss".to_string(), "  ".to_string()),
        ]);
        assert_eq!(update_links(&fx.ctx, &id, links).await.unwrap(), LinksChange::Updated);
        assert_eq!(fx.node("Box").links.len(), 1);

        let change = delete_protocol(&fx.ctx, &id, "trojan").await.unwrap();
        assert_eq!(change, LinksChange::NodeRemoved);
        assert!(fx.nodes().is_empty());
    }

    #[tokio::test]
    async fn test_clear_subscription_nodes() {
        let fx = fixture(
            Vec::new(),
            vec![
                NodeRecord::new_subscription("a", "trojan", "trojan://pw@a:443", None),
                NodeRecord::new_subscription("b", "trojan", "trojan://pw@b:443", None),
                NodeRecord::new_local("c", "trojan", "trojan://pw@c:443"),
            ],
        );
        assert_eq!(clear_subscription_nodes(&fx.ctx).await.unwrap(), 2);
        assert_eq!(clear_subscription_nodes(&fx.ctx).await.unwrap(), 0);
        assert_eq!(fx.nodes().len(), 1);
    }

    #[tokio::test]
    async fn test_update_routing_orders_and_pushes_store_changes() {
        let local_a = NodeRecord::new_local("a", "trojan", "trojan://pw@a:443");
        let sub_b = NodeRecord::new_subscription("b", "trojan", "trojan://pw@b:443", None);
        let (a, b) = (local_a.id.clone(), sub_b.id.clone());
        let fx = fixture(vec![store_node("s1", "sg", 1)], vec![local_a, sub_b]);
        regenerate_artifacts(&fx.ctx).await.unwrap();

        let groups = RoutingGroups {
            direct: vec!["s1".to_string(), b.clone()],
            relay: vec!["unknown".to_string()],
            unclassified: vec![a.clone()],
        };
        update_routing(&fx.ctx, &groups).await.unwrap();

        let nodes = fx.nodes();
        let order: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["s1", b.as_str(), a.as_str()]);
        assert_eq!(nodes[0].routing_type, RoutingClass::Direct);
        assert_eq!(nodes[0].sort_index, 0);
        assert_eq!(nodes[1].routing_type, RoutingClass::Direct);
        assert_eq!(nodes[2].routing_type, RoutingClass::Unclassified);
        assert_eq!(nodes[2].sort_index, 2);
        assert_eq!(fx.ctx.store.list_nodes().unwrap()[0].routing_type, Some(0));

        let direct = fx.read_output("0.yaml");
        assert!(direct.contains("hy2-sg"));
        assert!(fx.read_output("1.yaml").trim().ends_with("[]"));
        assert!(fx.dir.path().join("output").join("bundle.b64").exists());
    }
}
