pub mod node;
pub mod proxy;
pub mod subscription;

pub use node::{NodeRecord, Origin, RoutingClass, StoreNode, DEFAULT_SORT_INDEX};
pub use proxy::{
    CommonProxyOptions, GrpcOptions, H2Options, HttpOptions, Hysteria2Proxy, ProxyDescriptor,
    ProxyType, RealityOptions, ShadowsocksProxy, TransportOptions, TrojanProxy, TuicProxy,
    VMessProxy, VlessProxy, WsOptions,
};
pub use subscription::{
    FeedReport, OverallStatus, SubscriptionEntry, SyncOutcome, SyncRequest, SyncStatus,
    SyncSummary,
};
