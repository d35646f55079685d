//! Error types shared across the crate.

use std::path::Path;

use thiserror::Error;

/// Why a single share link could not be turned into a descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkParseError {
    #[error("unsupported link scheme: {0}")]
    UnsupportedScheme(String),

    #[error("payload is not valid base64")]
    InvalidBase64,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Failure to retrieve a subscription feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to send request: {0}")]
    Request(String),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Failure to read or write one of the on-disk documents.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON document {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize proxy list: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PersistenceError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        PersistenceError::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Failure of the authoritative node store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("node store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failure of an inventory-level operation (reconcile, sync, render).
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a user-facing management operation.
#[derive(Error, Debug)]
pub enum ManageError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node {0} is owned by the store and cannot be changed here")]
    ReadOnly(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid share link: {0}")]
    InvalidLink(#[from] LinkParseError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl From<PersistenceError> for ManageError {
    fn from(e: PersistenceError) -> Self {
        ManageError::Inventory(InventoryError::Persistence(e))
    }
}

impl From<StoreError> for ManageError {
    fn from(e: StoreError) -> Self {
        ManageError::Inventory(InventoryError::Store(e))
    }
}

/// Failure to load the TOML settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
