pub mod app;
pub mod error;
pub mod generator;
pub mod inventory;
pub mod models;
pub mod parser;
pub mod settings;
pub mod store;
pub mod utils;

// Re-export the main types for easier access
pub use app::AppContext;
pub use error::{InventoryError, LinkParseError, ManageError, PersistenceError, TransportError};
pub use models::{NodeRecord, ProxyDescriptor, ProxyType, RoutingClass};
pub use settings::Settings;
