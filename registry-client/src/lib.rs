//! Read-only client for a distributed node registry.
//!
//! The registry is a JSON document mapping node ids to node descriptors,
//! each listing the services the node exposes. The client fetches it over
//! HTTP, keeps the last good copy on disk, and falls back to that copy when
//! the live registry is unreachable or invalid.
//!
//! ```no_run
//! use node_registry_client::{ClientConfig, RegistryClient};
//!
//! let client = RegistryClient::new(ClientConfig::from_env())?;
//! let wps = client.node("nodeA")?.service("wps")?;
//! println!("{}", wps.url().unwrap_or("-"));
//! # Ok::<(), node_registry_client::RegistryError>(())
//! ```

pub mod acquire;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;

pub use acquire::{acquire, Acquisition, RegistryOrigin};
pub use cache::{CacheAge, CacheIo, CacheRecord, CacheStore, FileCache, StdIo};
pub use client::RegistryClient;
pub use config::ClientConfig;
pub use error::{FetchError, RegistryError, Result};
pub use fetch::{HttpFetcher, RegistrySource};
pub use model::{Links, Node, Registry, Service};
pub use shared::types::{Location, NodeStatus, RawDocument, RegistryDocument};
