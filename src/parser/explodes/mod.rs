pub mod common;
pub mod hysteria2;
pub mod ss;
mod transport;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;

pub use common::{build_proxy_name, emoji_flag, explode_link, parse_link, LinkParts};
