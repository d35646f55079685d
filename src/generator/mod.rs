pub mod artifacts;
pub mod links;
pub mod stats;

pub use artifacts::{node_label, render, write_artifacts, Artifacts, LOCAL_FLAG};
pub use links::descriptor_to_link;
pub use stats::{inventory_stats, protocol_label, InventoryStats};
