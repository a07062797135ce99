//! Mount a remote resource API as a filesystem
//!
//! Each configured collection becomes a directory, each object in it a
//! read-only JSON file, and writing a JSON object to `<collection>/_create`
//! creates a new object through the API.

pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "fuse")]
pub mod fuse;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod vfs;

use std::sync::Arc;

use tokio::runtime::Handle;

pub use client::{ApiClient, ApiError, HttpCollection, RemoteCollection, Resource};
pub use config::{Config, ConfigError};
pub use error::{FsError, FsResult};
pub use vfs::{ApiNode, CollectionDir, ExpiringCache, NamespaceRouter};

/// Build the router for `config`, one HTTP-backed directory per collection
///
/// Remote calls are driven on `runtime`, so the router must be used from
/// threads outside that runtime.
pub fn build_router(
    config: &Config,
    access_token: &str,
    runtime: Handle,
) -> Result<NamespaceRouter, ApiError> {
    let client = ApiClient::new(&config.api, access_token)?;
    let remotes = config
        .collections
        .iter()
        .map(|name| {
            Arc::new(HttpCollection::new(name, client.clone(), runtime.clone()))
                as Arc<dyn RemoteCollection>
        })
        .collect();
    Ok(NamespaceRouter::from_remotes(remotes, config.cache.ttl()))
}
